//! Provides input/output functionality for structure file formats.
//!
//! Formats implement the [`traits::StructureFile`] trait. Reading measures
//! torsions from the file's atoms and rebuilds the chain with ideal geometry,
//! so a pose read from disk behaves exactly like one built from a sequence.

pub mod pdb;
pub mod traits;
