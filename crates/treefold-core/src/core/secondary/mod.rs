//! Secondary-structure annotation: splitting annotation strings into spans
//! ([`spans`]) and assigning annotations from backbone torsions ([`assign`]).

pub mod assign;
pub mod spans;

pub use assign::assign;
pub use spans::{SecondaryStructureKind, SecondaryStructureSpan, segments};
