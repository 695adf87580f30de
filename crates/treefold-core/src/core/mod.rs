//! # Core Module
//!
//! The stateless foundation of treefold: the pose and its internal-coordinate
//! model, fold-tree kinematics, secondary structure, energy evaluation,
//! rotamers and file I/O.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Residues, torsions and the `Pose`
//! - **Kinematics** ([`kinematics`]) - Fold trees, jumps, the refold engine and move maps
//! - **Secondary Structure** ([`secondary`]) - Span segmentation and torsion-based assignment
//! - **Energy Calculations** ([`forcefield`]) - Pluggable energy methods and weighted score functions
//! - **Conformational Libraries** ([`rotamers`]) - Discrete side-chain conformations
//! - **File I/O** ([`io`]) - Reading and writing PDB coordinates
//!
//! Geometry helpers shared by all of the above live in [`utils`].

pub mod forcefield;
pub mod io;
pub mod kinematics;
pub mod models;
pub mod rotamers;
pub mod secondary;
pub mod utils;
