use std::fmt;

/// Identifies one torsional degree of freedom of a residue.
///
/// Side-chain torsions are numbered from 1, as in `Chi(1)` for chi1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TorsionKind {
    Phi,
    Psi,
    Omega,
    Chi(usize),
}

impl TorsionKind {
    pub fn is_backbone(&self) -> bool {
        !matches!(self, TorsionKind::Chi(_))
    }
}

impl fmt::Display for TorsionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TorsionKind::Phi => write!(f, "phi"),
            TorsionKind::Psi => write!(f, "psi"),
            TorsionKind::Omega => write!(f, "omega"),
            TorsionKind::Chi(index) => write!(f, "chi{}", index),
        }
    }
}
