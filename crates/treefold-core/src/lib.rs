//! # treefold Core Library
//!
//! Fold-tree kinematics and Monte Carlo sampling of protein backbones and side
//! chains.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Pose`, `FoldTree`),
//!   secondary-structure segmentation, the fold-tree builder, energy methods and
//!   the score function, rotamer libraries and PDB I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful sampling layer: perturbation,
//!   Metropolis acceptance, the Monte Carlo loop and the repacking and
//!   minimization bridges it drives.
//!
//! - **[`workflows`]: The Public API.** Complete procedures that tie `engine`
//!   and `core` together: installing a fold tree derived from secondary
//!   structure, and running one or many sampling trajectories.

pub mod core;
pub mod engine;
pub mod workflows;
