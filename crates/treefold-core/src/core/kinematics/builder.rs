use super::fold_tree::{FoldTree, FoldTreeError};
use crate::core::models::ids::{JumpId, SeqPos};
use crate::core::models::pose::Pose;
use crate::core::secondary::{SecondaryStructureSpan, assign, segments};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FoldTreeBuildError {
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
    #[error("Built fold tree is malformed: {0}")]
    MalformedTree(#[from] FoldTreeError),
}

/// What to do with residues after the last span when the chain is longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingCoverage {
    /// Stretch the last outward peptide edge to the final residue.
    #[default]
    Extend,
    /// Refuse to build a tree that does not cover the whole chain.
    Reject,
}

/// Builds a fold tree with one rigid segment per secondary-structure element.
///
/// The first span's midpoint is the root. Every later span, and every
/// non-empty loop before it, hangs from the root on its own jump and is built
/// outward from its midpoint by two peptide edges. Cutpoints therefore fall at
/// the boundaries between segments.
#[derive(Debug, Clone)]
pub struct FoldTreeBuilder {
    spans: Vec<SecondaryStructureSpan>,
    total_residues: Option<usize>,
    coverage: TrailingCoverage,
}

struct Assembly {
    tree: FoldTree,
    next_jump: JumpId,
    last_outward: Option<usize>,
    last_mid: SeqPos,
}

impl Assembly {
    /// Adds a segment `start..=end` hanging from `root` by a new jump.
    fn attach_segment(&mut self, root: SeqPos, start: SeqPos, end: SeqPos) {
        let mid = end - (end - start) / 2;
        self.tree.add_jump_edge(root, mid, self.next_jump);
        self.next_jump += 1;
        if mid != start {
            self.tree.add_peptide_edge(mid, start);
        }
        self.last_outward = if mid != end {
            Some(self.tree.add_peptide_edge(mid, end))
        } else {
            None
        };
        self.last_mid = mid;
    }
}

impl FoldTreeBuilder {
    pub fn new(spans: Vec<SecondaryStructureSpan>) -> Self {
        Self {
            spans,
            total_residues: None,
            coverage: TrailingCoverage::default(),
        }
    }

    /// Length of the chain the tree must cover.
    pub fn total_residues(mut self, nres: usize) -> Self {
        self.total_residues = Some(nres);
        self
    }

    pub fn coverage(mut self, policy: TrailingCoverage) -> Self {
        self.coverage = policy;
        self
    }

    pub fn build(&self) -> Result<FoldTree, FoldTreeBuildError> {
        self.validate_spans()?;
        let first = &self.spans[0];
        let root = first.midpoint();

        let mut assembly = Assembly {
            tree: FoldTree::new(root),
            next_jump: 1,
            last_outward: None,
            last_mid: root,
        };
        if root != 1 {
            assembly.tree.add_peptide_edge(root, 1);
        }
        if root != first.end {
            assembly.last_outward = Some(assembly.tree.add_peptide_edge(root, first.end));
        }

        for pair in self.spans.windows(2) {
            let (prev, span) = (&pair[0], &pair[1]);
            let (loop_start, loop_end) = (prev.end + 1, span.start - 1);
            if loop_start <= loop_end {
                assembly.attach_segment(root, loop_start, loop_end);
            }
            assembly.attach_segment(root, span.start, span.end);
        }

        let last_end = self.spans[self.spans.len() - 1].end;
        if let Some(nres) = self.total_residues {
            self.cover_trailing(&mut assembly, last_end, nres)?;
        }

        let tree = assembly.tree;
        tree.check()?;
        debug!(
            root,
            edges = tree.num_edges(),
            jumps = tree.num_jumps(),
            "Built fold tree from {} spans",
            self.spans.len()
        );
        Ok(tree)
    }

    fn validate_spans(&self) -> Result<(), FoldTreeBuildError> {
        if self.spans.is_empty() {
            return Err(FoldTreeBuildError::InvalidTopology(
                "no secondary-structure spans found".to_string(),
            ));
        }
        for span in &self.spans {
            if span.start == 0 || span.start > span.end {
                return Err(FoldTreeBuildError::InvalidTopology(format!(
                    "span {}-{} is not a valid residue range",
                    span.start, span.end
                )));
            }
        }
        for pair in self.spans.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(FoldTreeBuildError::InvalidTopology(format!(
                    "span {}-{} overlaps or precedes span {}-{}",
                    pair[1].start, pair[1].end, pair[0].start, pair[0].end
                )));
            }
        }
        Ok(())
    }

    fn cover_trailing(
        &self,
        assembly: &mut Assembly,
        last_end: SeqPos,
        nres: usize,
    ) -> Result<(), FoldTreeBuildError> {
        if nres < last_end {
            return Err(FoldTreeBuildError::InvalidTopology(format!(
                "span ending at residue {last_end} exceeds the chain length {nres}"
            )));
        }
        if nres == last_end {
            return Ok(());
        }
        match self.coverage {
            TrailingCoverage::Reject => Err(FoldTreeBuildError::InvalidTopology(format!(
                "residues {}..={} follow the last secondary-structure span",
                last_end + 1,
                nres
            ))),
            TrailingCoverage::Extend => {
                match assembly
                    .last_outward
                    .and_then(|index| assembly.tree.edge_mut(index))
                {
                    Some(edge) => edge.stop = nres,
                    None => {
                        assembly.tree.add_peptide_edge(assembly.last_mid, nres);
                    }
                }
                Ok(())
            }
        }
    }
}

/// Segments `ss` and builds the fold tree over its spans.
///
/// With `total_residues` set, residues after the last span are handled by
/// `coverage`.
pub fn fold_tree_from_ss(
    ss: &str,
    total_residues: Option<usize>,
    coverage: TrailingCoverage,
) -> Result<FoldTree, FoldTreeBuildError> {
    let mut builder = FoldTreeBuilder::new(segments(ss)).coverage(coverage);
    if let Some(nres) = total_residues {
        builder = builder.total_residues(nres);
    }
    builder.build()
}

/// Assigns secondary structure from the pose's own torsions and builds a tree
/// covering the whole pose.
pub fn fold_tree_from_pose(
    pose: &Pose,
    coverage: TrailingCoverage,
) -> Result<FoldTree, FoldTreeBuildError> {
    fold_tree_from_ss(&assign(pose), Some(pose.len()), coverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kinematics::fold_tree::Edge;
    use crate::core::kinematics::tree::KinematicTree;

    const SHEET_FIXTURE: &str = "   EEEEEEE    EEEEEEE         EEEEEEEEE    EEEEEEEEEE   HHHHHH         EEEEEEEEE         EEEEE     ";

    fn assert_well_formed(tree: &FoldTree) {
        assert!(tree.check().is_ok());
        let plan = KinematicTree::from_fold_tree(tree).unwrap();
        for seqpos in 1..=tree.nres() {
            if seqpos == tree.root() {
                assert_eq!(plan.parent(seqpos), None);
            } else {
                assert!(plan.parent(seqpos).is_some());
            }
        }
    }

    #[test]
    fn sheet_fixture_gives_thirty_eight_edges() {
        let spans = segments(SHEET_FIXTURE);
        assert_eq!(spans.len(), 7);
        let tree = FoldTreeBuilder::new(spans).build().unwrap();
        assert_eq!(tree.num_edges(), 38);
        assert_eq!(tree.num_jumps(), 12);
        assert_eq!(tree.root(), 7);
        assert_well_formed(&tree);
    }

    #[test]
    fn jump_ids_are_sequential_from_one() {
        let tree = fold_tree_from_ss(SHEET_FIXTURE, None, TrailingCoverage::Extend).unwrap();
        let ids: Vec<_> = tree.edges().iter().filter_map(Edge::jump_id).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn two_spans_with_loop_give_expected_edges_and_cutpoints() {
        let tree = fold_tree_from_ss("  HHHH   EEEE  ", Some(15), TrailingCoverage::Extend).unwrap();
        assert_eq!(
            tree.edges(),
            &[
                Edge::peptide(5, 1),
                Edge::peptide(5, 6),
                Edge::jump(5, 8, 1),
                Edge::peptide(8, 7),
                Edge::peptide(8, 9),
                Edge::jump(5, 12, 2),
                Edge::peptide(12, 10),
                Edge::peptide(12, 15),
            ]
        );
        assert_eq!(tree.cutpoints(), vec![6, 9]);
        assert_well_formed(&tree);
    }

    #[test]
    fn adjacent_spans_create_no_loop_jump() {
        let tree = fold_tree_from_ss("HHHEEE", None, TrailingCoverage::Extend).unwrap();
        assert_eq!(tree.num_jumps(), 1);
        assert_eq!(tree.to_string(), "FOLD_TREE  EDGE 2 1 -1  EDGE 2 3 -1  EDGE 2 5 1  EDGE 5 4 -1  EDGE 5 6 -1");
        assert_eq!(tree.cutpoints(), vec![3]);
        assert_well_formed(&tree);
    }

    #[test]
    fn trailing_single_residue_span_is_extended_from_its_midpoint() {
        let tree = fold_tree_from_ss("HHH E  ", Some(7), TrailingCoverage::Extend).unwrap();
        assert_eq!(tree.edges().last(), Some(&Edge::peptide(5, 7)));
        assert_eq!(tree.nres(), 7);
        assert_well_formed(&tree);
    }

    #[test]
    fn trailing_residues_can_be_rejected() {
        let result = fold_tree_from_ss("  HHHH  ", Some(8), TrailingCoverage::Reject);
        assert!(matches!(result, Err(FoldTreeBuildError::InvalidTopology(_))));

        let extended = fold_tree_from_ss("  HHHH  ", Some(8), TrailingCoverage::Extend).unwrap();
        assert_eq!(extended.edges(), &[Edge::peptide(5, 1), Edge::peptide(5, 8)]);
    }

    #[test]
    fn without_total_residues_tree_ends_at_last_span() {
        let tree = fold_tree_from_ss("  HHHH  ", None, TrailingCoverage::Reject).unwrap();
        assert_eq!(tree.nres(), 6);
    }

    #[test]
    fn no_spans_is_an_invalid_topology() {
        assert!(matches!(
            fold_tree_from_ss("LLLL", Some(4), TrailingCoverage::Extend),
            Err(FoldTreeBuildError::InvalidTopology(_))
        ));
    }

    #[test]
    fn malformed_span_lists_are_rejected() {
        use crate::core::secondary::SecondaryStructureKind::Helix;
        let overlapping = vec![
            SecondaryStructureSpan::new(1, 5, Helix),
            SecondaryStructureSpan::new(4, 8, Helix),
        ];
        assert!(matches!(
            FoldTreeBuilder::new(overlapping).build(),
            Err(FoldTreeBuildError::InvalidTopology(_))
        ));
        assert!(matches!(
            FoldTreeBuilder::new(vec![SecondaryStructureSpan::new(0, 3, Helix)]).build(),
            Err(FoldTreeBuildError::InvalidTopology(_))
        ));
        assert!(matches!(
            fold_tree_from_ss("HHHH", Some(2), TrailingCoverage::Extend),
            Err(FoldTreeBuildError::InvalidTopology(_))
        ));
    }

    #[test]
    fn fold_tree_from_pose_covers_the_whole_chain() {
        let pose = Pose::from_sequence(&"A".repeat(12)).unwrap();
        let tree = fold_tree_from_pose(&pose, TrailingCoverage::Extend).unwrap();
        assert_eq!(tree.root(), 7);
        assert_eq!(tree.edges(), &[Edge::peptide(7, 1), Edge::peptide(7, 12)]);
        assert_well_formed(&tree);
    }
}
