use crate::core::models::residue::AminoAcid;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Chi values sampled for chi1 and chi2 by the standard library.
pub const CHI_GRID: [f64; 3] = [-60.0, 60.0, 180.0];

/// Value used for chi3 and beyond in the standard library.
pub const DISTAL_CHI: f64 = 180.0;

/// Type alias for the raw rotamer data loaded from TOML files: residue
/// names mapped to lists of chi vectors.
type RawRotamerFile = HashMap<String, Vec<Vec<f64>>>;

/// One discrete side-chain conformation, given by its chi angles in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotamer {
    pub chis: Vec<f64>,
}

/// Discrete side-chain conformations per amino acid.
///
/// Residue types without chi angles (glycine, alanine) have no rotamers and
/// report an empty list.
#[derive(Debug, Default, Clone)]
pub struct RotamerLibrary {
    rotamers: HashMap<AminoAcid, Vec<Rotamer>>,
}

/// Errors raised while loading a rotamer library from disk.
#[derive(Debug, Error)]
pub enum LibraryLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Unknown residue type '{0}' found in library file")]
    UnknownResidueType(String),
    /// A rotamer lists a different number of chis than its residue type has.
    #[error("Rotamer for {residue} has {found} chi angles, expected {expected}")]
    ChiCountMismatch {
        residue: AminoAcid,
        expected: usize,
        found: usize,
    },
}

impl RotamerLibrary {
    /// The grid library: chi1 and chi2 each take every value of [`CHI_GRID`],
    /// remaining chis are fixed at [`DISTAL_CHI`].
    pub fn standard() -> Self {
        let mut rotamers = HashMap::new();
        for code in "ACDEFGHIKLMNPQRSTVWY".chars() {
            let Some(aa) = AminoAcid::from_one_letter(code) else {
                continue;
            };
            let count = aa.chi_count();
            if count == 0 {
                continue;
            }
            let chi2_values: &[f64] = if count >= 2 { &CHI_GRID } else { &[] };
            let mut list = Vec::new();
            for &chi1 in &CHI_GRID {
                if chi2_values.is_empty() {
                    list.push(Rotamer { chis: vec![chi1] });
                    continue;
                }
                for &chi2 in chi2_values {
                    let mut chis = vec![chi1, chi2];
                    chis.resize(count, DISTAL_CHI);
                    list.push(Rotamer { chis });
                }
            }
            rotamers.insert(aa, list);
        }
        Self { rotamers }
    }

    /// Loads a library from TOML of the form `LYS = [[-60.0, 180.0, 180.0, 180.0], ...]`.
    ///
    /// Residue names may be one- or three-letter codes. Residue types absent
    /// from the file have no rotamers.
    pub fn load(path: &Path) -> Result<Self, LibraryLoadError> {
        let display = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| LibraryLoadError::Io {
            path: display.clone(),
            source: e,
        })?;
        let raw: RawRotamerFile = toml::from_str(&content).map_err(|e| LibraryLoadError::Toml {
            path: display,
            source: e,
        })?;

        let mut library = Self::default();
        for (name, entries) in raw {
            let aa: AminoAcid = name
                .parse()
                .map_err(|_| LibraryLoadError::UnknownResidueType(name.clone()))?;
            for chis in entries {
                if chis.len() != aa.chi_count() {
                    return Err(LibraryLoadError::ChiCountMismatch {
                        residue: aa,
                        expected: aa.chi_count(),
                        found: chis.len(),
                    });
                }
                library.rotamers.entry(aa).or_default().push(Rotamer { chis });
            }
        }
        Ok(library)
    }

    pub fn rotamers_for(&self, aa: AminoAcid) -> &[Rotamer] {
        self.rotamers.get(&aa).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rotamers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
