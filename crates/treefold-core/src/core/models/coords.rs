use nalgebra::Point3;

/// Ideal backbone bond lengths (Å) and angles (degrees), Engh & Huber.
pub mod ideal {
    pub const N_CA: f64 = 1.458;
    pub const CA_C: f64 = 1.525;
    pub const C_N: f64 = 1.329;
    pub const C_O: f64 = 1.231;

    pub const N_CA_C: f64 = 111.2;
    pub const CA_C_N: f64 = 116.2;
    pub const C_N_CA: f64 = 121.7;
    pub const CA_C_O: f64 = 120.8;

    pub const CA_CB: f64 = 1.52;
    pub const C_CA_CB: f64 = 109.5;
    /// Dihedral N-C-CA-CB placing CB with L chirality.
    pub const N_C_CA_CB: f64 = 122.686;

    pub const SIDE_CHAIN_BOND: f64 = 1.52;
    pub const SIDE_CHAIN_ANGLE: f64 = 111.0;
}

/// Cartesian positions of the atoms modelled for one residue.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueCoords {
    pub n: Point3<f64>,
    pub ca: Point3<f64>,
    pub c: Point3<f64>,
    pub o: Point3<f64>,
    /// Side-chain spine atoms in the order given by `AminoAcid::side_chain_spine`.
    pub side_chain: Vec<Point3<f64>>,
}

impl ResidueCoords {
    pub(crate) fn unbuilt(side_chain_len: usize) -> Self {
        Self {
            n: Point3::origin(),
            ca: Point3::origin(),
            c: Point3::origin(),
            o: Point3::origin(),
            side_chain: vec![Point3::origin(); side_chain_len],
        }
    }

    pub fn backbone(&self) -> [Point3<f64>; 4] {
        [self.n, self.ca, self.c, self.o]
    }

    /// All modelled heavy atoms: backbone first, then the side-chain spine.
    pub fn heavy_atoms(&self) -> impl Iterator<Item = &Point3<f64>> {
        [&self.n, &self.ca, &self.c, &self.o]
            .into_iter()
            .chain(self.side_chain.iter())
    }

    /// Radius of the smallest CA-centred sphere containing every atom.
    pub fn extent(&self) -> f64 {
        self.heavy_atoms()
            .map(|p| (p - self.ca).norm())
            .fold(0.0, f64::max)
    }
}
