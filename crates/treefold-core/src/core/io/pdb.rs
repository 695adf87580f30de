use crate::core::io::traits::StructureFile;
use crate::core::models::ids::SeqPos;
use crate::core::models::pose::{Pose, PoseError};
use crate::core::models::residue::{AminoAcid, EXTENDED_PSI, Residue, default_chi};
use crate::core::utils::geometry::{backbone_stub, dihedral, normalize_angle};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Unknown residue name '{name}' on line {line}")]
    UnknownResidue { line: usize, name: String },
    #[error("Residue {residue} is missing backbone atom {atom}")]
    MissingBackboneAtom { residue: SeqPos, atom: &'static str },
    #[error("No ATOM records found")]
    NoResidues,
    #[error("Could not build pose: {0}")]
    Pose(#[from] PoseError),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Line is too short for an ATOM record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_coordinate(line: &str, start: usize, end: usize, line_num: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

struct RawResidue {
    key: String,
    aa: AminoAcid,
    atoms: HashMap<String, Point3<f64>>,
}

impl RawResidue {
    fn atom(&self, name: &str) -> Option<Point3<f64>> {
        self.atoms.get(name).copied()
    }
}

/// Protein Data Bank format, restricted to the ATOM records of one chain.
pub struct PdbFile;

impl PdbFile {
    fn collect_residues(reader: &mut impl BufRead) -> Result<Vec<RawResidue>, PdbError> {
        let mut residues: Vec<RawResidue> = Vec::new();
        let mut chain: Option<char> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "ATOM" => {}
                "ENDMDL" | "END" => break,
                _ => continue,
            }
            if line.len() < 54 {
                return Err(PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::LineTooShort,
                });
            }

            let chain_id = line.get(21..22).and_then(|s| s.chars().next()).unwrap_or(' ');
            if *chain.get_or_insert(chain_id) != chain_id {
                continue;
            }
            let alt_loc = slice_and_trim(&line, 16, 17);
            if !alt_loc.is_empty() && alt_loc != "A" {
                continue;
            }

            let name = slice_and_trim(&line, 12, 16);
            let res_name = slice_and_trim(&line, 17, 20);
            let key = line.get(22..27).unwrap_or("").to_string();
            let position = Point3::new(
                parse_coordinate(&line, 30, 38, line_num)?,
                parse_coordinate(&line, 38, 46, line_num)?,
                parse_coordinate(&line, 46, 54, line_num)?,
            );

            if residues.last().is_none_or(|r| r.key != key) {
                let aa = AminoAcid::from_three_letter(res_name).ok_or_else(|| {
                    PdbError::UnknownResidue {
                        line: line_num,
                        name: res_name.to_string(),
                    }
                })?;
                residues.push(RawResidue {
                    key,
                    aa,
                    atoms: HashMap::new(),
                });
            }
            if let Some(residue) = residues.last_mut() {
                residue.atoms.entry(name.to_string()).or_insert(position);
            }
        }
        Ok(residues)
    }

    /// Measures torsions from the raw atoms. Values that need a missing atom
    /// fall back to extended/default values.
    fn derive_residues(raw: &[RawResidue]) -> Result<(Vec<Residue>, [Point3<f64>; 3]), PdbError> {
        let mut backbone = Vec::with_capacity(raw.len());
        for (index, residue) in raw.iter().enumerate() {
            let require = |atom: &'static str| {
                residue.atom(atom).ok_or(PdbError::MissingBackboneAtom {
                    residue: index + 1,
                    atom,
                })
            };
            backbone.push((require("N")?, require("CA")?, require("C")?));
        }

        let nres = raw.len();
        let mut residues = Vec::with_capacity(nres);
        for (i, source) in raw.iter().enumerate() {
            let (n, ca, c) = backbone[i];
            let mut residue = Residue::new(source.aa);
            if i > 0 {
                residue.phi = dihedral(&backbone[i - 1].2, &n, &ca, &c);
            }
            if i + 1 < nres {
                let (next_n, next_ca, _) = backbone[i + 1];
                residue.psi = dihedral(&n, &ca, &c, &next_n);
                residue.omega = dihedral(&ca, &c, &next_n, &next_ca);
            } else {
                residue.psi = source
                    .atom("O")
                    .map_or(EXTENDED_PSI, |o| normalize_angle(dihedral(&n, &ca, &c, &o) - 180.0));
            }

            let mut chain = vec![Some(n), Some(ca)];
            chain.extend(source.aa.side_chain_spine().iter().map(|name| source.atom(name)));
            for (k, chi) in residue.chis.iter_mut().enumerate() {
                *chi = match (chain[k], chain[k + 1], chain[k + 2], chain[k + 3]) {
                    (Some(a), Some(b), Some(c), Some(d)) => dihedral(&a, &b, &c, &d),
                    _ => default_chi(k + 1),
                };
            }
            residues.push(residue);
        }

        let (n, ca, c) = backbone[0];
        Ok((residues, [n, ca, c]))
    }
}

impl StructureFile for PdbFile {
    type Error = PdbError;

    /// Reads the first chain of the first model and rebuilds it with ideal
    /// geometry from the measured torsions, rooted at residue 1.
    fn read_from(reader: &mut impl BufRead) -> Result<Pose, Self::Error> {
        let raw = Self::collect_residues(reader)?;
        if raw.is_empty() {
            return Err(PdbError::NoResidues);
        }
        let (residues, [n, ca, c]) = Self::derive_residues(&raw)?;
        debug!("Read {} residues from PDB records", residues.len());
        let pose = Pose::from_residues(residues, backbone_stub(&n, &ca, &c))?;
        Ok(pose)
    }

    fn write_to(pose: &Pose, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut serial = 0;
        for atom in pose.atoms() {
            serial += 1;
            let name = if atom.name.len() < 4 {
                format!(" {:<3}", atom.name)
            } else {
                atom.name.to_string()
            };
            writeln!(
                writer,
                "ATOM  {:>5} {} {:>3} A{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                serial,
                name,
                atom.aa.three_letter(),
                atom.seqpos,
                atom.position.x,
                atom.position.y,
                atom.position.z,
                1.0,
                0.0,
                atom.element()
            )?;
        }
        if let Some(last) = pose.residue(pose.len()) {
            writeln!(
                writer,
                "TER   {:>5}      {:>3} A{:>4}",
                serial + 1,
                last.aa().three_letter(),
                pose.len()
            )?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}
