use crate::core::forcefield::scoring::{ScoreFunction, ScoringError};
use crate::core::kinematics::movemap::MoveMap;
use crate::core::models::ids::SeqPos;
use crate::core::models::pose::{Pose, PoseError};
use crate::core::models::torsion::TorsionKind;
use nalgebra::DVector;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

const LBFGS_HISTORY: usize = 8;
const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 30;
/// Largest change of any single torsion in one line-search trial, in degrees.
const MAX_STEP_DEGREES: f64 = 10.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MinimizeError {
    #[error("Energy became non-finite during minimization ({value})")]
    NonFinite { value: f64 },
    #[error("Scoring failed during minimization: {0}")]
    Scoring(ScoringError),
    #[error("Could not update pose: {0}")]
    Pose(#[from] PoseError),
    #[error("Unknown minimizer algorithm '{0}'")]
    UnknownAlgorithm(String),
    #[error("Invalid minimizer option '{option}': {reason}")]
    InvalidOption { option: &'static str, reason: String },
}

impl From<ScoringError> for MinimizeError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::NonFinite { value, .. } => MinimizeError::NonFinite { value },
            other => MinimizeError::Scoring(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinimizerType {
    /// L-BFGS with Armijo line search, converged on an absolute decrease.
    LbfgsArmijoAtol,
    /// L-BFGS with Armijo line search, converged on a relative decrease.
    LbfgsArmijo,
    SteepestDescent,
}

impl MinimizerType {
    pub fn name(&self) -> &'static str {
        match self {
            MinimizerType::LbfgsArmijoAtol => "lbfgs_armijo_atol",
            MinimizerType::LbfgsArmijo => "lbfgs_armijo",
            MinimizerType::SteepestDescent => "steepest_descent",
        }
    }

    fn uses_history(&self) -> bool {
        !matches!(self, MinimizerType::SteepestDescent)
    }

    fn absolute_tolerance(&self) -> bool {
        !matches!(self, MinimizerType::LbfgsArmijo)
    }
}

impl FromStr for MinimizerType {
    type Err = MinimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lbfgs_armijo_atol" => Ok(MinimizerType::LbfgsArmijoAtol),
            "lbfgs_armijo" => Ok(MinimizerType::LbfgsArmijo),
            "steepest_descent" => Ok(MinimizerType::SteepestDescent),
            _ => Err(MinimizeError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for MinimizerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizerOptions {
    pub algorithm: MinimizerType,
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Finite-difference step for the gradient, in degrees.
    pub gradient_step: f64,
}

impl MinimizerOptions {
    pub const DEFAULT_MAX_ITERATIONS: usize = 200;
    pub const DEFAULT_GRADIENT_STEP: f64 = 0.01;

    /// Options for the named algorithm, e.g. `"lbfgs_armijo_atol"`.
    pub fn new(algorithm: &str, tolerance: f64) -> Result<Self, MinimizeError> {
        let algorithm = algorithm.parse()?;
        Self::with_algorithm(algorithm, tolerance)
    }

    pub fn with_algorithm(algorithm: MinimizerType, tolerance: f64) -> Result<Self, MinimizeError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(MinimizeError::InvalidOption {
                option: "tolerance",
                reason: format!("must be a finite non-negative number, got {tolerance}"),
            });
        }
        Ok(Self {
            algorithm,
            tolerance,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            gradient_step: Self::DEFAULT_GRADIENT_STEP,
        })
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn gradient_step(mut self, degrees: f64) -> Result<Self, MinimizeError> {
        if !degrees.is_finite() || degrees <= 0.0 {
            return Err(MinimizeError::InvalidOption {
                option: "gradient_step",
                reason: format!("must be a finite positive number, got {degrees}"),
            });
        }
        self.gradient_step = degrees;
        Ok(self)
    }
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self {
            algorithm: MinimizerType::LbfgsArmijoAtol,
            tolerance: 0.01,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            gradient_step: Self::DEFAULT_GRADIENT_STEP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizationOutcome {
    pub iterations: usize,
    pub initial_score: f64,
    pub final_score: f64,
    pub converged: bool,
}

/// Local gradient-based relaxation of the torsions a move map frees.
pub trait Minimizer: Send + Sync {
    fn minimize(
        &self,
        pose: &mut Pose,
        movemap: &MoveMap,
        sfxn: &ScoreFunction,
        options: &MinimizerOptions,
    ) -> Result<MinimizationOutcome, MinimizeError>;
}

/// Minimizes the score over torsion space with finite-difference gradients.
///
/// The score never increases: every accepted step satisfies the Armijo
/// condition, and a failed line search leaves the pose at the last accepted
/// point.
#[derive(Debug, Default, Clone, Copy)]
pub struct TorsionMinimizer;

struct Objective<'a> {
    pose: &'a mut Pose,
    dofs: Vec<(SeqPos, TorsionKind)>,
    sfxn: &'a ScoreFunction,
}

impl Objective<'_> {
    fn current(&self) -> Result<DVector<f64>, MinimizeError> {
        let values = self
            .dofs
            .iter()
            .map(|&(seqpos, kind)| self.pose.torsion(seqpos, kind))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DVector::from_vec(values))
    }

    fn score(&self) -> Result<f64, MinimizeError> {
        let value = self.sfxn.total(&*self.pose)?;
        if !value.is_finite() {
            return Err(MinimizeError::NonFinite { value });
        }
        Ok(value)
    }

    fn set(&mut self, x: &DVector<f64>) -> Result<(), MinimizeError> {
        let batch: Vec<_> = self
            .dofs
            .iter()
            .zip(x.iter())
            .map(|(&(seqpos, kind), &value)| (seqpos, kind, value))
            .collect();
        self.pose.set_torsions(&batch)?;
        Ok(())
    }

    fn value_at(&mut self, x: &DVector<f64>) -> Result<f64, MinimizeError> {
        self.set(x)?;
        self.score()
    }

    /// Central-difference gradient at `x`; leaves the pose at `x`.
    fn gradient(&mut self, x: &DVector<f64>, step: f64) -> Result<DVector<f64>, MinimizeError> {
        self.set(x)?;
        let mut grad = DVector::zeros(x.len());
        for (i, &(seqpos, kind)) in self.dofs.clone().iter().enumerate() {
            self.pose.set_torsion(seqpos, kind, x[i] + step)?;
            let forward = self.score()?;
            self.pose.set_torsion(seqpos, kind, x[i] - step)?;
            let backward = self.score()?;
            self.pose.set_torsion(seqpos, kind, x[i])?;
            grad[i] = (forward - backward) / (2.0 * step);
        }
        Ok(grad)
    }
}

fn lbfgs_direction(
    grad: &DVector<f64>,
    history: &VecDeque<(DVector<f64>, DVector<f64>, f64)>,
) -> DVector<f64> {
    let mut q = grad.clone();
    let mut alphas = Vec::with_capacity(history.len());
    for (s, y, rho) in history.iter().rev() {
        let alpha = rho * s.dot(&q);
        q -= y * alpha;
        alphas.push(alpha);
    }
    if let Some((s, y, _)) = history.back() {
        q *= s.dot(y) / y.dot(y);
    }
    for ((s, y, rho), alpha) in history.iter().zip(alphas.into_iter().rev()) {
        let beta = rho * y.dot(&q);
        q += s * (alpha - beta);
    }
    -q
}

fn has_converged(options: &MinimizerOptions, previous: f64, current: f64) -> bool {
    let decrease = previous - current;
    if options.algorithm.absolute_tolerance() {
        decrease <= options.tolerance
    } else {
        2.0 * decrease <= options.tolerance * (previous.abs() + current.abs() + 1e-10)
    }
}

impl Minimizer for TorsionMinimizer {
    fn minimize(
        &self,
        pose: &mut Pose,
        movemap: &MoveMap,
        sfxn: &ScoreFunction,
        options: &MinimizerOptions,
    ) -> Result<MinimizationOutcome, MinimizeError> {
        let dofs = movemap.degrees_of_freedom(pose);
        let mut objective = Objective { pose, dofs, sfxn };
        let initial_score = objective.score()?;
        if objective.dofs.is_empty() {
            return Ok(MinimizationOutcome {
                iterations: 0,
                initial_score,
                final_score: initial_score,
                converged: true,
            });
        }

        let mut x = objective.current()?;
        let mut f = initial_score;
        let mut grad = objective.gradient(&x, options.gradient_step)?;
        let mut history = VecDeque::with_capacity(LBFGS_HISTORY);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < options.max_iterations {
            iterations += 1;

            let mut direction = if options.algorithm.uses_history() {
                lbfgs_direction(&grad, &history)
            } else {
                -&grad
            };
            let mut slope = grad.dot(&direction);
            if slope >= 0.0 {
                history.clear();
                direction = -&grad;
                slope = grad.dot(&direction);
            }
            if slope == 0.0 {
                converged = true;
                break;
            }

            let largest = direction.amax();
            let mut alpha = if largest > MAX_STEP_DEGREES {
                MAX_STEP_DEGREES / largest
            } else {
                1.0
            };
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let trial = &x + &direction * alpha;
                let value = objective.value_at(&trial)?;
                if value <= f + ARMIJO_C1 * alpha * slope {
                    accepted = Some((trial, value));
                    break;
                }
                alpha *= 0.5;
            }

            let Some((x_new, f_new)) = accepted else {
                objective.set(&x)?;
                trace!(iterations, score = f, "Line search failed; stopping at last point");
                break;
            };

            let grad_new = objective.gradient(&x_new, options.gradient_step)?;
            let s = &x_new - &x;
            let y = &grad_new - &grad;
            let sy = s.dot(&y);
            if sy > 1e-10 {
                if history.len() == LBFGS_HISTORY {
                    history.pop_front();
                }
                history.push_back((s, y, 1.0 / sy));
            }

            let done = has_converged(options, f, f_new);
            x = x_new;
            f = f_new;
            grad = grad_new;
            if done {
                converged = true;
                break;
            }
        }

        trace!(iterations, initial_score, final_score = f, converged, "Minimization finished");
        Ok(MinimizationOutcome {
            iterations,
            initial_score,
            final_score: f,
            converged,
        })
    }
}
