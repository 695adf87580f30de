//! # Core Models Module
//!
//! Data structures describing a single protein chain in internal coordinates.
//!
//! ## Overview
//!
//! A [`pose::Pose`] owns per-residue torsions, the fold tree with its jumps and a
//! root stub. Cartesian coordinates are derived from those and re-propagated by
//! every mutator, so readers always see a consistent structure.
//!
//! ## Key Components
//!
//! - [`residue`] - Amino-acid identities and per-residue torsions
//! - [`torsion`] - Names of the torsional degrees of freedom
//! - [`coords`] - Built atom positions and ideal geometry constants
//! - [`pose`] - The mutable structure object
//! - [`ids`] - Index aliases for residues and jumps
//!
//! ## Usage
//!
//! ```ignore
//! use treefold::core::models::{pose::Pose, torsion::TorsionKind};
//!
//! let mut pose = Pose::from_sequence("MKTAYIAK")?;
//! pose.set_torsion(4, TorsionKind::Phi, -60.0)?;
//! let ca = pose.atom_position(8, "CA");
//! ```

pub mod coords;
pub mod ids;
pub mod pose;
pub mod residue;
pub mod torsion;
