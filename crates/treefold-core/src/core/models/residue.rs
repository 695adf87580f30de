use crate::core::utils::geometry::normalize_angle;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Backbone torsions of a freshly built, fully extended residue.
pub const EXTENDED_PHI: f64 = -150.0;
pub const EXTENDED_PSI: f64 = 150.0;
pub const TRANS_OMEGA: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AminoAcid {
    // --- Aliphatic, Nonpolar ---
    Alanine,
    Glycine,
    Isoleucine,
    Leucine,
    Proline,
    Valine,

    // --- Aromatic ---
    Phenylalanine,
    Tryptophan,
    Tyrosine,

    // --- Polar, Uncharged ---
    Asparagine,
    Cysteine,
    Glutamine,
    Serine,
    Threonine,
    Methionine,

    // --- Charged ---
    Arginine,
    Lysine,
    AsparticAcid,
    GlutamicAcid,
    Histidine,
}

static THREE_LETTER_CODES: Map<&'static str, AminoAcid> = phf_map! {
    "ALA" => AminoAcid::Alanine,
    "GLY" => AminoAcid::Glycine,
    "ILE" => AminoAcid::Isoleucine,
    "LEU" => AminoAcid::Leucine,
    "PRO" => AminoAcid::Proline,
    "VAL" => AminoAcid::Valine,
    "PHE" => AminoAcid::Phenylalanine,
    "TRP" => AminoAcid::Tryptophan,
    "TYR" => AminoAcid::Tyrosine,
    "ASN" => AminoAcid::Asparagine,
    "CYS" => AminoAcid::Cysteine,
    "GLN" => AminoAcid::Glutamine,
    "SER" => AminoAcid::Serine,
    "THR" => AminoAcid::Threonine,
    "MET" => AminoAcid::Methionine,
    "ARG" => AminoAcid::Arginine,
    "LYS" => AminoAcid::Lysine,
    "ASP" => AminoAcid::AsparticAcid,
    "GLU" => AminoAcid::GlutamicAcid,
    "HIS" => AminoAcid::Histidine,
    // Common protonation-state and naming variants.
    "HSE" => AminoAcid::Histidine,
    "HSD" => AminoAcid::Histidine,
    "HSP" => AminoAcid::Histidine,
    "HIE" => AminoAcid::Histidine,
    "HID" => AminoAcid::Histidine,
    "HIP" => AminoAcid::Histidine,
    "CYX" => AminoAcid::Cysteine,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown amino acid code: '{0}'")]
pub struct ParseAminoAcidError(pub String);

impl AminoAcid {
    pub fn from_one_letter(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'A' => Some(AminoAcid::Alanine),
            'G' => Some(AminoAcid::Glycine),
            'I' => Some(AminoAcid::Isoleucine),
            'L' => Some(AminoAcid::Leucine),
            'P' => Some(AminoAcid::Proline),
            'V' => Some(AminoAcid::Valine),
            'F' => Some(AminoAcid::Phenylalanine),
            'W' => Some(AminoAcid::Tryptophan),
            'Y' => Some(AminoAcid::Tyrosine),
            'N' => Some(AminoAcid::Asparagine),
            'C' => Some(AminoAcid::Cysteine),
            'Q' => Some(AminoAcid::Glutamine),
            'S' => Some(AminoAcid::Serine),
            'T' => Some(AminoAcid::Threonine),
            'M' => Some(AminoAcid::Methionine),
            'R' => Some(AminoAcid::Arginine),
            'K' => Some(AminoAcid::Lysine),
            'D' => Some(AminoAcid::AsparticAcid),
            'E' => Some(AminoAcid::GlutamicAcid),
            'H' => Some(AminoAcid::Histidine),
            _ => None,
        }
    }

    pub fn from_three_letter(code: &str) -> Option<Self> {
        THREE_LETTER_CODES
            .get(code.trim().to_ascii_uppercase().as_str())
            .copied()
    }

    pub fn one_letter(&self) -> char {
        match self {
            AminoAcid::Alanine => 'A',
            AminoAcid::Glycine => 'G',
            AminoAcid::Isoleucine => 'I',
            AminoAcid::Leucine => 'L',
            AminoAcid::Proline => 'P',
            AminoAcid::Valine => 'V',
            AminoAcid::Phenylalanine => 'F',
            AminoAcid::Tryptophan => 'W',
            AminoAcid::Tyrosine => 'Y',
            AminoAcid::Asparagine => 'N',
            AminoAcid::Cysteine => 'C',
            AminoAcid::Glutamine => 'Q',
            AminoAcid::Serine => 'S',
            AminoAcid::Threonine => 'T',
            AminoAcid::Methionine => 'M',
            AminoAcid::Arginine => 'R',
            AminoAcid::Lysine => 'K',
            AminoAcid::AsparticAcid => 'D',
            AminoAcid::GlutamicAcid => 'E',
            AminoAcid::Histidine => 'H',
        }
    }

    pub fn three_letter(&self) -> &'static str {
        match self {
            AminoAcid::Alanine => "ALA",
            AminoAcid::Glycine => "GLY",
            AminoAcid::Isoleucine => "ILE",
            AminoAcid::Leucine => "LEU",
            AminoAcid::Proline => "PRO",
            AminoAcid::Valine => "VAL",
            AminoAcid::Phenylalanine => "PHE",
            AminoAcid::Tryptophan => "TRP",
            AminoAcid::Tyrosine => "TYR",
            AminoAcid::Asparagine => "ASN",
            AminoAcid::Cysteine => "CYS",
            AminoAcid::Glutamine => "GLN",
            AminoAcid::Serine => "SER",
            AminoAcid::Threonine => "THR",
            AminoAcid::Methionine => "MET",
            AminoAcid::Arginine => "ARG",
            AminoAcid::Lysine => "LYS",
            AminoAcid::AsparticAcid => "ASP",
            AminoAcid::GlutamicAcid => "GLU",
            AminoAcid::Histidine => "HIS",
        }
    }

    /// Heavy atoms of the side-chain spine, starting at CB.
    ///
    /// Each atom after CB is positioned by one chi angle, so a residue has
    /// `spine.len() - 1` chis. Branches off the spine are not modelled.
    pub fn side_chain_spine(&self) -> &'static [&'static str] {
        match self {
            AminoAcid::Glycine => &[],
            AminoAcid::Alanine => &["CB"],
            AminoAcid::Serine => &["CB", "OG"],
            AminoAcid::Cysteine => &["CB", "SG"],
            AminoAcid::Threonine => &["CB", "OG1"],
            AminoAcid::Valine => &["CB", "CG1"],
            AminoAcid::Isoleucine => &["CB", "CG1", "CD1"],
            AminoAcid::Leucine => &["CB", "CG", "CD1"],
            AminoAcid::Methionine => &["CB", "CG", "SD", "CE"],
            AminoAcid::Phenylalanine | AminoAcid::Tyrosine | AminoAcid::Tryptophan => {
                &["CB", "CG", "CD1"]
            }
            AminoAcid::Histidine => &["CB", "CG", "ND1"],
            AminoAcid::AsparticAcid | AminoAcid::Asparagine => &["CB", "CG", "OD1"],
            AminoAcid::GlutamicAcid | AminoAcid::Glutamine => &["CB", "CG", "CD", "OE1"],
            AminoAcid::Lysine => &["CB", "CG", "CD", "CE", "NZ"],
            AminoAcid::Arginine => &["CB", "CG", "CD", "NE", "CZ"],
            AminoAcid::Proline => &["CB", "CG"],
        }
    }

    pub fn chi_count(&self) -> usize {
        self.side_chain_spine().len().saturating_sub(1)
    }
}

impl FromStr for AminoAcid {
    type Err = ParseAminoAcidError;

    /// Accepts either a one-letter or a three-letter code, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let parsed = match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_one_letter(c),
            _ => Self::from_three_letter(trimmed),
        };
        parsed.ok_or_else(|| ParseAminoAcidError(trimmed.to_string()))
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.three_letter())
    }
}

/// Default chi value used when no side-chain conformation is known.
pub fn default_chi(index: usize) -> f64 {
    if index == 1 { -60.0 } else { 180.0 }
}

/// Internal coordinates of one residue: identity plus its torsions in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    aa: AminoAcid,
    pub(crate) phi: f64,
    pub(crate) psi: f64,
    pub(crate) omega: f64,
    pub(crate) chis: Vec<f64>,
}

impl Residue {
    /// Creates a residue in the extended conformation with default chis.
    pub fn new(aa: AminoAcid) -> Self {
        let chis = (1..=aa.chi_count()).map(default_chi).collect();
        Self {
            aa,
            phi: EXTENDED_PHI,
            psi: EXTENDED_PSI,
            omega: TRANS_OMEGA,
            chis,
        }
    }

    /// Creates a residue with explicit backbone torsions; angles are normalised.
    pub fn with_backbone(aa: AminoAcid, phi: f64, psi: f64, omega: f64) -> Self {
        let mut residue = Self::new(aa);
        residue.phi = normalize_angle(phi);
        residue.psi = normalize_angle(psi);
        residue.omega = normalize_angle(omega);
        residue
    }

    pub fn aa(&self) -> AminoAcid {
        self.aa
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn psi(&self) -> f64 {
        self.psi
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn chis(&self) -> &[f64] {
        &self.chis
    }
}
