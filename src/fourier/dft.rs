//! Direct-summation inverse transform.
//!
//! O(N⁴) and only suitable for small grids.  Kept as the reference the
//! butterfly transform is checked against.

use std::f64::consts::PI;

use num_complex::{Complex, Complex32};
use rayon::prelude::*;

use super::{FourierSolver, PackedPair};

/// Basis wavenumbers whose squared length falls below this are skipped,
/// which drops the DC term.
const DC_EPSILON: f64 = 1e-5;

/// Reference solver summing every input cell for every output cell.
///
/// The basis uses grid-unit wavenumbers `π(2n − N)/N`, independent of the
/// world scale of the patch: the transform only maps grid indices to grid
/// indices.
#[derive(Clone, Debug)]
pub struct BruteForceDft {
    size: usize,
    /// Basis wavenumber for each index along one axis.
    basis: Vec<f64>,
}

impl BruteForceDft {
    pub fn new(size: usize) -> Self {
        let basis = (0..size)
            .map(|i| PI * (2.0 * i as f64 - size as f64) / size as f64)
            .collect();
        Self { size, basis }
    }

    fn cell(&self, x: usize, z: usize, input: &[PackedPair]) -> PackedPair {
        let n = self.size;
        let mut acc = [Complex::<f64>::new(0.0, 0.0); 2];
        for (m, &kz) in self.basis.iter().enumerate() {
            for (col, &kx) in self.basis.iter().enumerate() {
                if kx * kx + kz * kz < DC_EPSILON {
                    continue;
                }
                let (sin, cos) = (kx * x as f64 + kz * z as f64).sin_cos();
                let rot = Complex::new(cos, sin);
                let h = &input[col + m * n];
                acc[0] += Complex::new(h[0].re as f64, h[0].im as f64) * rot;
                acc[1] += Complex::new(h[1].re as f64, h[1].im as f64) * rot;
            }
        }
        [
            Complex32::new(acc[0].re as f32, acc[0].im as f32),
            Complex32::new(acc[1].re as f32, acc[1].im as f32),
        ]
    }
}

impl FourierSolver for BruteForceDft {
    fn size(&self) -> usize {
        self.size
    }

    fn transform(&self, input: &[PackedPair]) -> Vec<PackedPair> {
        let n = self.size;
        assert_eq!(input.len(), n * n, "input must be N×N");
        (0..n * n)
            .into_par_iter()
            .map(|idx| self.cell(idx % n, idx / n, input))
            .collect()
    }
}
