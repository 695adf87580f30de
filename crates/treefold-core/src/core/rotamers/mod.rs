//! # Rotamers Module
//!
//! Discrete side-chain conformations used by repacking.
//!
//! A [`library::RotamerLibrary`] maps each amino acid to a list of chi vectors.
//! The built-in grid library samples chi1 and chi2 at the three staggered
//! values; custom libraries can be loaded from TOML.

pub mod library;
