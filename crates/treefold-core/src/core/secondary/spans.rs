use crate::core::models::ids::SeqPos;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryStructureKind {
    Helix,
    Strand,
}

impl SecondaryStructureKind {
    /// `H` and `E` are structured; every other character is not.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'H' => Some(Self::Helix),
            'E' => Some(Self::Strand),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            Self::Helix => 'H',
            Self::Strand => 'E',
        }
    }
}

/// A maximal run of one secondary-structure type, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecondaryStructureSpan {
    pub start: SeqPos,
    pub end: SeqPos,
    pub kind: SecondaryStructureKind,
}

impl SecondaryStructureSpan {
    pub fn new(start: SeqPos, end: SeqPos, kind: SecondaryStructureKind) -> Self {
        Self { start, end, kind }
    }

    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Central residue; the upper one of the two for even lengths.
    pub fn midpoint(&self) -> SeqPos {
        self.end - (self.end - self.start) / 2
    }

    pub fn contains(&self, seqpos: SeqPos) -> bool {
        self.start <= seqpos && seqpos <= self.end
    }
}

impl fmt::Display for SecondaryStructureSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.kind.code(), self.start, self.end)
    }
}

/// Splits a per-residue annotation string into helix and strand spans.
///
/// A change from `H` to `E` (or back) closes the current span and opens a new
/// one at the same position; any other character closes the open span.
pub fn segments(ss: &str) -> Vec<SecondaryStructureSpan> {
    let mut spans = Vec::new();
    let mut open: Option<(SeqPos, SecondaryStructureKind)> = None;
    let mut len = 0;

    for (index, code) in ss.chars().enumerate() {
        let seqpos = index + 1;
        len = seqpos;
        let kind = SecondaryStructureKind::from_code(code);
        match open {
            Some((_, current)) if kind == Some(current) => {}
            Some((start, current)) => {
                spans.push(SecondaryStructureSpan::new(start, seqpos - 1, current));
                open = kind.map(|k| (seqpos, k));
            }
            None => open = kind.map(|k| (seqpos, k)),
        }
    }
    if let Some((start, kind)) = open {
        spans.push(SecondaryStructureSpan::new(start, len, kind));
    }
    spans
}
