//! # Engine Module
//!
//! The stateful sampling layer: Monte Carlo search over a pose's torsions with
//! side-chain repacking, local minimization and Metropolis acceptance.
//!
//! ## Overview
//!
//! Each trial of the [`monte_carlo::MonteCarloLoop`] draws a random phi/psi
//! change ([`perturbation`]), repacks side chains and minimizes through the
//! bridges in [`tasks`], scores the result and lets the
//! [`metropolis::MetropolisCriterion`] decide. Rejected or failed trials
//! restore the pose from a snapshot.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Sampling parameters and their builder
//! - **State Tracking** ([`state`]) - Running statistics, per-trial records and the final report
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-level error type
//!
//! ## Failure Tiers
//!
//! - Not applicable: nothing to pack, or nothing for the minimizer to move. The trial continues.
//! - Failed: repacking or minimization returns an error. The trial is recorded as aborted.
//! - Fatal: scoring fails. The run stops with [`error::EngineError::Scoring`].

pub mod config;
pub mod error;
pub mod metropolis;
pub mod monte_carlo;
pub mod perturbation;
pub mod progress;
pub mod state;
pub mod tasks;
