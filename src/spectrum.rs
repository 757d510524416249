//! Static wave spectrum: initial complex amplitudes and quantised dispersion.
//!
//! The table covers the `(N+1)×(N+1)` index space so that every index `n`
//! has its mirror `N-n` inside the table.  Wavenumbers are centred:
//!
//!   k = π·(2·idx − N) / world_scale
//!
//! which puts `k = 0` at `idx = N/2`.  Angular frequencies are snapped down to
//! a multiple of `ω₀ = 2π/T`, so every mode completes a whole number of
//! cycles in one repeat period and a baked loop closes without a seam.

use std::f32::consts::PI;

use num_complex::Complex32;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{MAX_WIND_EXPONENT, OceanConfig};

/// Below this wavenumber length the spectrum carries no energy.
pub const SPECTRUM_EPSILON: f32 = 1e-6;

/// Centred wavenumber for `index` on a grid of `size` cells spanning `extent`.
#[inline]
pub fn wavenumber(index: usize, size: usize, extent: f32) -> f32 {
    PI * (2.0 * index as f32 - size as f32) / extent
}

/// Deep-water dispersion `√(g·|k|)` rounded down to a multiple of `base`.
#[inline]
pub fn quantized_dispersion(k_length: f32, gravity: f32, base: f32) -> f32 {
    ((gravity * k_length).sqrt() / base).floor() * base
}

/// Draw a pair of independent standard normal samples packed as one complex
/// number, using the polar (Marsaglia) form of Box–Muller.
///
/// Candidates are drawn uniformly from the square `(-1, 1)²` and rejected
/// unless they fall strictly inside the unit disc.  The origin is rejected
/// too, since `ln(0)` would poison the sample.
pub fn gaussian_pair<R: Rng + ?Sized>(rng: &mut R) -> Complex32 {
    loop {
        let x1 = 2.0 * rng.random::<f32>() - 1.0;
        let x2 = 2.0 * rng.random::<f32>() - 1.0;
        let w = x1 * x1 + x2 * x2;
        if w < 1.0 && w > 0.0 {
            let scale = (-2.0 * w.ln() / w).sqrt();
            return Complex32::new(x1 * scale, x2 * scale);
        }
    }
}

/// Directional Phillips spectrum parameterised by wind.
#[derive(Clone, Debug)]
pub struct PhillipsSpectrum {
    amplitude: f32,
    /// Unit wind direction, or zero when there is no wind.
    wind_dir: [f32; 2],
    /// Largest wave arising from the wind: `|V|² / g`.
    wind_length: f32,
    exponent: i32,
    damping: f32,
}

impl PhillipsSpectrum {
    pub fn new(config: &OceanConfig) -> Self {
        let [wx, wz] = config.wind;
        let speed = (wx * wx + wz * wz).sqrt();
        let wind_dir = if speed > SPECTRUM_EPSILON {
            [wx / speed, wz / speed]
        } else {
            [0.0, 0.0]
        };
        Self {
            amplitude: config.amplitude,
            wind_dir,
            wind_length: speed * speed / config.gravity,
            exponent: i32::try_from(config.wind_alignment_exponent.min(MAX_WIND_EXPONENT))
                .unwrap_or(0),
            damping: config.small_wave_damping,
        }
    }

    /// Energy at wave vector `k`.  Zero at `k = 0` and without wind.
    pub fn energy(&self, k: [f32; 2]) -> f32 {
        let k_length = (k[0] * k[0] + k[1] * k[1]).sqrt();
        if k_length < SPECTRUM_EPSILON || self.wind_length <= 0.0 {
            return 0.0;
        }
        let k2 = k_length * k_length;
        let k4 = k2 * k2;
        let l2 = self.wind_length * self.wind_length;
        let small = self.damping * self.wind_length;

        let k_dot_w = (k[0] * self.wind_dir[0] + k[1] * self.wind_dir[1]) / k_length;
        let directional = k_dot_w.powi(self.exponent);

        self.amplitude * (-1.0 / (k2 * l2)).exp() / k4 * directional * (-k2 * small * small).exp()
    }
}

/// Per-wavenumber initial amplitudes and angular frequencies.
///
/// Built once per simulation and read-only afterwards; the wave-factor
/// evaluation in [`crate::wave`] only borrows it, so any number of threads
/// can evaluate against the same grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectrumGrid {
    size: usize,
    world_scale: f32,
    h0: Vec<Complex32>,
    h0_conj: Vec<Complex32>,
    dispersion: Vec<f32>,
}

impl SpectrumGrid {
    /// Build the grid with an RNG seeded from `config.seed`.
    pub fn from_seed(config: &OceanConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::generate(config, &mut rng)
    }

    /// Build the grid, drawing one Gaussian pair per cell from `rng` in
    /// row-major scan order.  The same RNG state always yields the same grid
    /// for a given size.
    pub fn generate<R: Rng + ?Sized>(config: &OceanConfig, rng: &mut R) -> Self {
        let n = config.grid_size.max(1).next_power_of_two();
        let stride = n + 1;
        let phillips = PhillipsSpectrum::new(config);
        let base = config.base_frequency();

        let mut h0 = Vec::with_capacity(stride * stride);
        let mut dispersion = Vec::with_capacity(stride * stride);
        for m in 0..stride {
            let kz = wavenumber(m, n, config.world_scale);
            for col in 0..stride {
                let kx = wavenumber(col, n, config.world_scale);
                let k_length = (kx * kx + kz * kz).sqrt();
                dispersion.push(quantized_dispersion(k_length, config.gravity, base));
                let gauss = gaussian_pair(rng);
                h0.push(gauss * (phillips.energy([kx, kz]) / 2.0).sqrt());
            }
        }

        // The mirror of index i is N - i, which the extra row/column keeps in range.
        let mut h0_conj = Vec::with_capacity(stride * stride);
        for m in 0..stride {
            for col in 0..stride {
                h0_conj.push(h0[(n - m) * stride + (n - col)].conj());
            }
        }

        Self {
            size: n,
            world_scale: config.world_scale,
            h0,
            h0_conj,
            dispersion,
        }
    }

    /// Grid size `N` (the table itself is `(N+1)²`).
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn world_scale(&self) -> f32 {
        self.world_scale
    }

    #[inline]
    pub(crate) fn index(&self, n: usize, m: usize) -> usize {
        debug_assert!(n <= self.size && m <= self.size, "spectrum index out of range");
        m * (self.size + 1) + n
    }

    pub fn h0(&self, n: usize, m: usize) -> Complex32 {
        self.h0[self.index(n, m)]
    }

    pub fn h0_conj(&self, n: usize, m: usize) -> Complex32 {
        self.h0_conj[self.index(n, m)]
    }

    pub fn dispersion(&self, n: usize, m: usize) -> f32 {
        self.dispersion[self.index(n, m)]
    }
}
