use crate::core::forcefield::scoring::ScoreFunction;
use crate::core::forcefield::term::ScoreType;
use crate::core::kinematics::builder::{fold_tree_from_pose, fold_tree_from_ss};
use crate::core::kinematics::fold_tree::FoldTree;
use crate::core::models::pose::Pose;
use crate::engine::config::FoldTreeConfig;
use crate::engine::error::EngineError;
use tracing::{info, instrument};

/// Derives a fold tree from secondary structure and installs it on `pose`.
///
/// With `ss` the annotation is used as given (it may be shorter than the pose,
/// in which case `config.coverage` decides what happens to the trailing
/// residues); without it the pose's own torsions are assigned first. When the
/// resulting tree has cutpoints the chain-break term is switched on at the
/// configured weight.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTopology`] when the annotation has no
/// structured residues or is longer than the pose, and
/// [`EngineError::MalformedTree`] if the derived tree fails validation.
#[instrument(skip_all, name = "fold_tree_setup")]
pub fn prepare(
    pose: &mut Pose,
    ss: Option<&str>,
    config: &FoldTreeConfig,
    sfxn: &mut ScoreFunction,
) -> Result<FoldTree, EngineError> {
    let tree = match ss {
        Some(ss) => {
            let length = ss.chars().count();
            if length > pose.len() {
                return Err(EngineError::InvalidTopology(format!(
                    "secondary structure has {length} positions but the pose has {} residues",
                    pose.len()
                )));
            }
            fold_tree_from_ss(ss, Some(pose.len()), config.coverage)?
        }
        None => fold_tree_from_pose(pose, config.coverage)?,
    };

    pose.set_fold_tree(tree.clone())?;
    let cutpoints = tree.cutpoints();
    if !cutpoints.is_empty() {
        sfxn.set_weight(ScoreType::LinearChainbreak, config.chainbreak_weight)?;
    }
    info!(
        root = tree.root(),
        jumps = tree.num_jumps(),
        cutpoints = ?cutpoints,
        "Fold tree installed."
    );
    Ok(tree)
}
