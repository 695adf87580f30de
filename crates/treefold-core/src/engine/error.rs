use thiserror::Error;

use super::config::ConfigError;
use super::tasks::minimize::MinimizeError;
use super::tasks::repack::RepackError;
use crate::core::forcefield::scoring::ScoringError;
use crate::core::kinematics::builder::FoldTreeBuildError;
use crate::core::kinematics::fold_tree::FoldTreeError;
use crate::core::models::pose::PoseError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid fold-tree topology: {0}")]
    InvalidTopology(String),

    #[error("Malformed fold tree: {0}")]
    MalformedTree(#[from] FoldTreeError),

    #[error("Energy scoring failed: {source}")]
    Scoring {
        #[from]
        source: ScoringError,
    },

    #[error("Repacking failed: {0}")]
    Repack(#[from] RepackError),

    #[error("Minimization failed: {0}")]
    Minimize(#[from] MinimizeError),

    #[error("Pose update failed: {0}")]
    Pose(#[from] PoseError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl From<FoldTreeBuildError> for EngineError {
    fn from(err: FoldTreeBuildError) -> Self {
        match err {
            FoldTreeBuildError::InvalidTopology(reason) => EngineError::InvalidTopology(reason),
            FoldTreeBuildError::MalformedTree(source) => EngineError::MalformedTree(source),
        }
    }
}
