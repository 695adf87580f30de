//! # Kinematics Module
//!
//! Describes how coordinate changes propagate through a pose.
//!
//! - [`fold_tree`] - The spanning tree of peptide and jump edges
//! - [`builder`] - Derives a fold tree from secondary-structure spans
//! - [`tree`] - Per-residue build plan and NeRF refolding
//! - [`jump`] - Rigid-body transforms between residue stubs
//! - [`movemap`] - Which torsions a minimizer may change

pub mod builder;
pub mod fold_tree;
pub mod jump;
pub mod movemap;
pub mod tree;
