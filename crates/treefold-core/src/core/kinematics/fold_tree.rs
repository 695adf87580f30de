use crate::core::models::ids::{JumpId, SeqPos};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Label used for peptide edges in the textual fold-tree format.
pub const PEPTIDE_LABEL: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Contiguous bonded backbone, built residue by residue from `start` to `stop`.
    Peptide,
    /// Rigid-body connection carrying the jump with the given id.
    Jump(JumpId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub start: SeqPos,
    pub stop: SeqPos,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn peptide(start: SeqPos, stop: SeqPos) -> Self {
        Self {
            start,
            stop,
            kind: EdgeKind::Peptide,
        }
    }

    pub fn jump(start: SeqPos, stop: SeqPos, id: JumpId) -> Self {
        Self {
            start,
            stop,
            kind: EdgeKind::Jump(id),
        }
    }

    pub fn is_peptide(&self) -> bool {
        self.kind == EdgeKind::Peptide
    }

    pub fn jump_id(&self) -> Option<JumpId> {
        match self.kind {
            EdgeKind::Jump(id) => Some(id),
            EdgeKind::Peptide => None,
        }
    }

    /// Residues whose parent is set by this edge, in build order.
    pub fn downstream(&self) -> Vec<SeqPos> {
        match self.kind {
            EdgeKind::Jump(_) => vec![self.stop],
            EdgeKind::Peptide if self.start < self.stop => ((self.start + 1)..=self.stop).collect(),
            EdgeKind::Peptide => (self.stop..self.start).rev().collect(),
        }
    }

    /// Whether this peptide edge spans the backbone bond between `seqpos` and `seqpos + 1`.
    pub fn covers_bond(&self, seqpos: SeqPos) -> bool {
        self.is_peptide() && self.start.min(self.stop) <= seqpos && seqpos < self.start.max(self.stop)
    }

    fn label(&self) -> i64 {
        match self.kind {
            EdgeKind::Peptide => PEPTIDE_LABEL,
            EdgeKind::Jump(id) => id as i64,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FoldTreeError {
    #[error("Fold tree contains no residues")]
    Empty,
    #[error("Root residue {root} is outside the tree's residue range 1..={nres}")]
    RootOutOfRange { root: SeqPos, nres: usize },
    #[error("Edge #{edge} references residue {residue}, which is outside 1..={nres}")]
    ResidueOutOfRange {
        edge: usize,
        residue: SeqPos,
        nres: usize,
    },
    #[error("Edge #{edge} starts and stops at residue {residue}")]
    SelfEdge { edge: usize, residue: SeqPos },
    #[error("Residue {residue} has more than one parent (second parent set by edge #{edge})")]
    MultipleParents { residue: SeqPos, edge: usize },
    #[error("Residue {residue} is not reachable from the root")]
    Unreachable { residue: SeqPos },
    #[error("Jump ids must be exactly 1..={expected}, found {found:?}")]
    JumpNumbering { expected: usize, found: Vec<JumpId> },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseFoldTreeError {
    #[error("Fold tree string must start with 'FOLD_TREE'")]
    MissingHeader,
    #[error("Malformed EDGE record at token {position}: {reason}")]
    MalformedEdge { position: usize, reason: String },
}

/// A spanning tree over residue positions built from peptide and jump edges.
///
/// The tree owns its edges in an arena and addresses them by index. Use
/// [`FoldTree::check`] before trusting a hand-assembled tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FoldTree {
    root: SeqPos,
    edges: Vec<Edge>,
}

impl FoldTree {
    pub fn new(root: SeqPos) -> Self {
        Self {
            root,
            edges: Vec::new(),
        }
    }

    /// The trivial tree for a chain of `nres` residues: rooted at 1 with a
    /// single peptide edge to the C-terminus.
    pub fn simple(nres: usize) -> Self {
        let mut tree = Self::new(1);
        if nres > 1 {
            tree.add_peptide_edge(1, nres);
        }
        tree
    }

    pub fn add_peptide_edge(&mut self, start: SeqPos, stop: SeqPos) -> usize {
        self.edges.push(Edge::peptide(start, stop));
        self.edges.len() - 1
    }

    pub fn add_jump_edge(&mut self, start: SeqPos, stop: SeqPos, id: JumpId) -> usize {
        self.edges.push(Edge::jump(start, stop, id));
        self.edges.len() - 1
    }

    pub fn root(&self) -> SeqPos {
        self.root
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    pub(crate) fn edge_mut(&mut self, index: usize) -> Option<&mut Edge> {
        self.edges.get_mut(index)
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_jumps(&self) -> usize {
        self.edges.iter().filter(|e| !e.is_peptide()).count()
    }

    pub fn jump_edge(&self, id: JumpId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.jump_id() == Some(id))
    }

    /// Number of residues spanned: the largest residue index mentioned anywhere.
    pub fn nres(&self) -> usize {
        self.edges
            .iter()
            .flat_map(|e| [e.start, e.stop])
            .fold(self.root, usize::max)
    }

    /// Positions `c` such that no peptide edge connects `c` to `c + 1`.
    pub fn cutpoints(&self) -> Vec<SeqPos> {
        (1..self.nres())
            .filter(|&c| !self.edges.iter().any(|e| e.covers_bond(c)))
            .collect()
    }

    pub fn is_cutpoint(&self, seqpos: SeqPos) -> bool {
        seqpos >= 1
            && seqpos < self.nres()
            && !self.edges.iter().any(|e| e.covers_bond(seqpos))
    }

    /// Validates the tree, reporting the first violation found.
    ///
    /// Checks, in order: non-emptiness, root and endpoint ranges, self edges,
    /// jump numbering, single parenthood and reachability from the root.
    pub fn check(&self) -> Result<(), FoldTreeError> {
        if self.root == 0 && self.edges.is_empty() {
            return Err(FoldTreeError::Empty);
        }
        let nres = self.nres();
        if self.root == 0 {
            return Err(FoldTreeError::RootOutOfRange {
                root: self.root,
                nres,
            });
        }

        for (index, edge) in self.edges.iter().enumerate() {
            for residue in [edge.start, edge.stop] {
                if residue == 0 {
                    return Err(FoldTreeError::ResidueOutOfRange {
                        edge: index,
                        residue,
                        nres,
                    });
                }
            }
            if edge.start == edge.stop {
                return Err(FoldTreeError::SelfEdge {
                    edge: index,
                    residue: edge.start,
                });
            }
        }

        let mut jump_ids: Vec<JumpId> = self.edges.iter().filter_map(Edge::jump_id).collect();
        jump_ids.sort_unstable();
        if jump_ids.iter().enumerate().any(|(i, &id)| id != i + 1) {
            return Err(FoldTreeError::JumpNumbering {
                expected: jump_ids.len(),
                found: jump_ids,
            });
        }

        let mut has_parent = vec![false; nres + 1];
        has_parent[self.root] = true;
        for (index, edge) in self.edges.iter().enumerate() {
            for residue in edge.downstream() {
                if has_parent[residue] {
                    return Err(FoldTreeError::MultipleParents {
                        residue,
                        edge: index,
                    });
                }
                has_parent[residue] = true;
            }
        }

        let mut reached = vec![false; nres + 1];
        let mut queue = VecDeque::from([self.root]);
        reached[self.root] = true;
        while let Some(current) = queue.pop_front() {
            for edge in self.edges.iter().filter(|e| e.start == current) {
                for residue in edge.downstream() {
                    if !reached[residue] {
                        reached[residue] = true;
                        queue.push_back(residue);
                    }
                }
            }
        }
        if let Some(residue) = (1..=nres).find(|&r| !reached[r]) {
            return Err(FoldTreeError::Unreachable { residue });
        }

        Ok(())
    }
}

impl fmt::Display for FoldTree {
    /// Formats the tree as `FOLD_TREE  EDGE a b -1  EDGE a c 1 ...`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FOLD_TREE")?;
        for edge in &self.edges {
            write!(f, "  EDGE {} {} {}", edge.start, edge.stop, edge.label())?;
        }
        Ok(())
    }
}

impl FromStr for FoldTree {
    type Err = ParseFoldTreeError;

    /// Parses the textual format produced by `Display`. The root is taken to be
    /// the start of the first edge.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.first() != Some(&"FOLD_TREE") {
            return Err(ParseFoldTreeError::MissingHeader);
        }

        let mut tree = FoldTree::new(0);
        let mut position = 1;
        while position < tokens.len() {
            let malformed = |reason: &str| ParseFoldTreeError::MalformedEdge {
                position,
                reason: reason.to_string(),
            };
            if tokens[position] != "EDGE" {
                return Err(malformed("expected 'EDGE'"));
            }
            let fields = tokens
                .get(position + 1..position + 4)
                .ok_or_else(|| malformed("expected three fields after 'EDGE'"))?;
            let start: SeqPos = fields[0]
                .parse()
                .map_err(|_| malformed("start is not a residue index"))?;
            let stop: SeqPos = fields[1]
                .parse()
                .map_err(|_| malformed("stop is not a residue index"))?;
            let label: i64 = fields[2]
                .parse()
                .map_err(|_| malformed("label is not an integer"))?;

            match label {
                PEPTIDE_LABEL => {
                    tree.add_peptide_edge(start, stop);
                }
                id if id > 0 => {
                    tree.add_jump_edge(start, stop, id as JumpId);
                }
                _ => return Err(malformed("unsupported edge label")),
            }
            if tree.root == 0 {
                tree.root = start;
            }
            position += 4;
        }
        Ok(tree)
    }
}
