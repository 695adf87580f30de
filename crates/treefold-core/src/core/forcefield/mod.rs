//! # Force Field Module
//!
//! Energy evaluation for poses.
//!
//! ## Overview
//!
//! A [`scoring::ScoreFunction`] is a weighted sum of [`scoring::EnergyMethod`]s.
//! The set of methods is open: callers may add their own next to the built-in
//! terms in [`methods`]:
//!
//! - **vdw** - softened Lennard-Jones 12-6 between heavy atoms
//! - **rama** - three-basin Ramachandran well
//! - **omega** - trans-peptide penalty
//! - **linear_chainbreak** - closure of fold-tree cutpoints
//!
//! ## Key Components
//!
//! - [`scoring`] - The `EnergyMethod` trait and `ScoreFunction`
//! - [`term`] - Score types and the per-term `EnergyMap`
//! - [`params`] - Term weights loaded from TOML
//! - [`potentials`] - Pairwise functional forms
//!
//! ## Usage
//!
//! ```ignore
//! use treefold::core::forcefield::{scoring::ScoreFunction, term::ScoreType};
//!
//! let mut sfxn = ScoreFunction::standard();
//! sfxn.set_weight(ScoreType::LinearChainbreak, 1.0)?;
//! let energies = sfxn.score(&pose)?;
//! println!("{energies}");
//! ```

pub mod methods;
pub mod params;
pub(crate) mod potentials;
pub mod scoring;
pub mod term;
