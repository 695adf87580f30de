//! Collaborator bridges used inside each Monte Carlo trial.
//!
//! Each bridge is a trait the sampling loop calls through, plus a small
//! reference implementation:
//!
//! - [`repack`] - side-chain packing (`Repacker`, `GreedyRepacker`)
//! - [`minimize`] - torsion-space minimization (`Minimizer`, `TorsionMinimizer`)

pub mod minimize;
pub mod repack;
