//! Time-domain wave factors.
//!
//! For wavenumber index `(n, m)` at time `t`:
//!
//!   W(t) = h0·e^{iωt} + h0conj·e^{−iωt}
//!
//! Because `h0conj` is the conjugate of the mirrored amplitude, `W(−k)` is the
//! conjugate of `W(k)` and the inverse transform of the field is real.

use num_complex::Complex32;

use crate::spectrum::{SpectrumGrid, wavenumber};

impl SpectrumGrid {
    /// Complex amplitude of mode `(n, m)` at time `t`.
    pub fn wave_factor(&self, t: f32, n: usize, m: usize) -> Complex32 {
        let (sin, cos) = (self.dispersion(n, m) * t).sin_cos();
        let rot = Complex32::new(cos, sin);
        self.h0(n, m) * rot + self.h0_conj(n, m) * rot.conj()
    }

    /// Physical wave vector `(kx, kz)` of mode `(n, m)`.
    pub fn wave_vector(&self, n: usize, m: usize) -> [f32; 2] {
        [
            wavenumber(n, self.size(), self.world_scale()),
            wavenumber(m, self.size(), self.world_scale()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use crate::config::OceanConfig;
    use crate::spectrum::SpectrumGrid;

    fn grid() -> SpectrumGrid {
        SpectrumGrid::from_seed(&OceanConfig {
            grid_size: 8,
            ..OceanConfig::default()
        })
    }

    #[test]
    fn factor_at_time_zero_is_sum_of_amplitudes() {
        let g = grid();
        for m in 0..=8 {
            for n in 0..=8 {
                let expected = g.h0(n, m) + g.h0_conj(n, m);
                assert_eq!(g.wave_factor(0.0, n, m), expected, "mode ({n},{m})");
            }
        }
    }

    #[test]
    fn factor_is_hermitian_across_the_grid() {
        let g = grid();
        let n = g.size();
        for t in [0.0, 1.7, 42.0] {
            for m in 0..=n {
                for col in 0..=n {
                    let a = g.wave_factor(t, col, m);
                    let b = g.wave_factor(t, n - col, n - m).conj();
                    assert!((a - b).norm() <= 1e-6 * (1.0 + a.norm()), "({col},{m}) t={t}");
                }
            }
        }
    }

    #[test]
    fn factor_repeats_after_one_period() {
        let config = OceanConfig {
            grid_size: 8,
            repeat_period: 20.0,
            ..OceanConfig::default()
        };
        let g = SpectrumGrid::from_seed(&config);
        for m in 0..=8 {
            for n in 0..=8 {
                let a = g.wave_factor(0.0, n, m);
                let b = g.wave_factor(config.repeat_period, n, m);
                assert!((a - b).norm() <= 1e-4 * (1.0 + a.norm()), "mode ({n},{m})");
            }
        }
    }

    #[test]
    fn wave_vector_is_zero_at_centre() {
        let g = grid();
        assert_eq!(g.wave_vector(4, 4), [0.0, 0.0]);
        let [kx, kz] = g.wave_vector(0, 8);
        assert!(kx < 0.0 && kz > 0.0);
    }
}
