//! # Workflows Module
//!
//! End-to-end procedures built from the `core` and `engine` layers.
//!
//! - **Fold-tree setup** ([`setup`]) - Derive a fold tree from secondary
//!   structure, install it on the pose and enable the chain-break term.
//! - **Sampling** ([`sample`]) - Run one seeded Monte Carlo trajectory, or many
//!   independent trajectories in parallel.
//!
//! A typical run:
//!
//! ```ignore
//! let mut sfxn = ScoreFunction::standard();
//! setup::prepare(&mut pose, Some(ss), &config.fold_tree, &mut sfxn)?;
//! let report = sample::run(pose, &sfxn, &repacker, &TorsionMinimizer, &config, &reporter)?;
//! ```

pub mod sample;
pub mod setup;
