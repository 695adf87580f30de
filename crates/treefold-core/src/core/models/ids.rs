/// 1-based position of a residue in the chain.
pub type SeqPos = usize;

/// 1-based label of a jump edge in a fold tree.
pub type JumpId = usize;
