//! Inverse 2-D Fourier transforms over `N×N` grids of packed complex pairs.
//!
//! Each cell carries two independent complex channels (for example the x and
//! z components of the slope), so one pass transforms both.  Input cells are
//! indexed row-major as `n + m·N`, with frequency index `n` standing for the
//! centred wavenumber `n − N/2`.  Output cells are indexed `x + z·N`.
//!
//! Both solvers compute
//!
//!   out(x, z) = Σ in(n, m) · e^{2πi((n − N/2)·x + (m − N/2)·z)/N}
//!
//! with no normalisation.  [`BruteForceDft`] is the direct sum and exists as
//! a reference; [`ButterflyFft`] is what simulations use.

pub mod dft;
pub mod fft;

pub use dft::BruteForceDft;
pub use fft::{ButterflyFft, ButterflyTable, butterfly_table};

use num_complex::Complex32;

use crate::config::SolverKind;

/// Two complex channels transformed side by side.
pub type PackedPair = [Complex32; 2];

/// Zero value for a [`PackedPair`].
pub const ZERO_PAIR: PackedPair = [Complex32::new(0.0, 0.0), Complex32::new(0.0, 0.0)];

/// Inverse 2-D transform engine for a fixed grid size.
pub trait FourierSolver: Send + Sync {
    /// Side length `N` of the grids this solver accepts.
    fn size(&self) -> usize;

    /// Transform an `N×N` frequency-domain grid into the spatial domain.
    ///
    /// # Panics
    /// If `input.len() != N·N`.
    fn transform(&self, input: &[PackedPair]) -> Vec<PackedPair>;
}

/// A solver chosen once, at configuration time.
#[derive(Clone, Debug)]
pub enum Solver {
    BruteForce(BruteForceDft),
    Fft(ButterflyFft),
}

impl Solver {
    /// Build the solver `kind` for grids of side `size` (a power of two).
    pub fn new(kind: SolverKind, size: usize) -> Self {
        match kind {
            SolverKind::BruteForce => Solver::BruteForce(BruteForceDft::new(size)),
            SolverKind::Fft => Solver::Fft(ButterflyFft::new(size)),
        }
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Solver::BruteForce(_) => SolverKind::BruteForce,
            Solver::Fft(_) => SolverKind::Fft,
        }
    }
}

impl FourierSolver for Solver {
    fn size(&self) -> usize {
        match self {
            Solver::BruteForce(s) => s.size(),
            Solver::Fft(s) => s.size(),
        }
    }

    fn transform(&self, input: &[PackedPair]) -> Vec<PackedPair> {
        match self {
            Solver::BruteForce(s) => s.transform(input),
            Solver::Fft(s) => s.transform(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Random input with the DC cell cleared; the reference sum skips it.
    fn random_input(size: usize, seed: u64) -> Vec<PackedPair> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut input: Vec<PackedPair> = (0..size * size)
            .map(|_| {
                [
                    Complex32::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
                    Complex32::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
                ]
            })
            .collect();
        let centre = size / 2;
        input[centre + centre * size] = ZERO_PAIR;
        input
    }

    fn max_norm(values: &[PackedPair]) -> f32 {
        values
            .iter()
            .flat_map(|p| [p[0].norm(), p[1].norm()])
            .fold(0.0, f32::max)
    }

    #[test]
    fn fft_matches_brute_force() {
        for size in [4usize, 8, 16, 32] {
            let input = random_input(size, size as u64);
            let reference = Solver::new(SolverKind::BruteForce, size).transform(&input);
            let fast = Solver::new(SolverKind::Fft, size).transform(&input);
            assert_eq!(reference.len(), size * size);
            assert_eq!(fast.len(), size * size);

            let tolerance = 1e-3 * max_norm(&reference).max(1e-6);
            for (i, (a, b)) in reference.iter().zip(&fast).enumerate() {
                for ch in 0..2 {
                    let err = (a[ch] - b[ch]).norm();
                    assert!(
                        err <= tolerance,
                        "N={size} cell {i} channel {ch}: brute {:?} vs fft {:?}",
                        a[ch],
                        b[ch]
                    );
                }
            }
        }
    }

    #[test]
    fn single_mode_produces_plane_wave() {
        let size = 8;
        let mut input = vec![ZERO_PAIR; size * size];
        // Frequency index n = N/2 + 1 is one cycle across the grid in x.
        input[size / 2 + 1 + (size / 2) * size] = [Complex32::new(1.0, 0.0), ZERO_PAIR[1]];
        for kind in [SolverKind::BruteForce, SolverKind::Fft] {
            let out = Solver::new(kind, size).transform(&input);
            for z in 0..size {
                for x in 0..size {
                    let phase = std::f32::consts::TAU * x as f32 / size as f32;
                    let got = out[x + z * size][0];
                    assert!((got.re - phase.cos()).abs() < 1e-5, "{kind:?} ({x},{z})");
                    assert!((got.im - phase.sin()).abs() < 1e-5, "{kind:?} ({x},{z})");
                    assert!(out[x + z * size][1].norm() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn solver_reports_kind_and_size() {
        let s = Solver::new(SolverKind::Fft, 16);
        assert_eq!(s.kind(), SolverKind::Fft);
        assert_eq!(s.size(), 16);
        let b = Solver::new(SolverKind::BruteForce, 4);
        assert_eq!(b.kind(), SolverKind::BruteForce);
        assert_eq!(b.size(), 4);
    }
}
