//! Simulation and bake configuration, plus the errors raised when validating it.

use bevy::log::warn;
use serde::{Deserialize, Serialize};

/// Largest supported grid side.  The brute-force solver is O(N⁴) and a
/// baked set holds `frames × N²` texels per channel, so this bounds memory.
pub const MAX_GRID_SIZE: usize = 1024;

/// Smallest supported grid side.  A single cell has no wave other than the
/// Nyquist mode, on which the two solvers do not agree.
pub const MIN_GRID_SIZE: usize = 2;

/// Largest accepted `wind_alignment_exponent`.  Beyond this the directional
/// term is already zero for all but exactly wind-aligned waves.
pub const MAX_WIND_EXPONENT: u32 = 64;

/// Largest supported number of baked frames.
pub const MAX_FRAME_COUNT: usize = 4096;

/// Error returned when ocean or bake parameters are invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum OceanError {
    /// `grid_size` was zero.
    ZeroGridSize,
    /// `grid_size` was below [`MIN_GRID_SIZE`].
    GridSizeTooSmall { size: usize, min: usize },
    /// `grid_size` (after power-of-two rounding) exceeded [`MAX_GRID_SIZE`].
    GridSizeTooLarge { size: usize, max: usize },
    /// A length, period or gravity parameter was zero, negative or not finite.
    NonPositive { field: &'static str, value: f32 },
    /// A wind component was NaN or infinite.
    NonFiniteWind([f32; 2]),
    /// The wave amplitude was negative or not finite.
    InvalidAmplitude(f32),
    /// Odd exponents make the directional term negative for waves running
    /// against the wind, which has no square root.
    OddWindExponent(u32),
    /// The wind alignment exponent exceeded [`MAX_WIND_EXPONENT`].
    WindExponentTooLarge { exponent: u32, max: u32 },
    /// `frame_count` was zero.
    ZeroFrameCount,
    /// `frame_count` exceeded [`MAX_FRAME_COUNT`].
    TooManyFrames { count: usize, max: usize },
    /// UV correction was requested with zero fixed-point iterations.
    ZeroUvIterations,
}

impl std::fmt::Display for OceanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OceanError::ZeroGridSize => write!(f, "grid size must be non-zero"),
            OceanError::GridSizeTooSmall { size, min } => {
                write!(f, "grid size {size} is below MIN_GRID_SIZE={min}")
            }
            OceanError::GridSizeTooLarge { size, max } => {
                write!(f, "grid size {size} exceeds MAX_GRID_SIZE={max}")
            }
            OceanError::NonPositive { field, value } => {
                write!(f, "{field} must be positive and finite (got {value})")
            }
            OceanError::NonFiniteWind([x, z]) => {
                write!(f, "wind must be finite (got [{x}, {z}])")
            }
            OceanError::InvalidAmplitude(a) => {
                write!(f, "wave amplitude must be non-negative and finite (got {a})")
            }
            OceanError::OddWindExponent(p) => {
                write!(f, "wind alignment exponent must be even (got {p})")
            }
            OceanError::WindExponentTooLarge { exponent, max } => {
                write!(f, "wind alignment exponent {exponent} exceeds MAX_WIND_EXPONENT={max}")
            }
            OceanError::ZeroFrameCount => write!(f, "bake frame count must be non-zero"),
            OceanError::TooManyFrames { count, max } => {
                write!(f, "bake frame count {count} exceeds MAX_FRAME_COUNT={max}")
            }
            OceanError::ZeroUvIterations => {
                write!(f, "uv correction needs at least one iteration")
            }
        }
    }
}

impl std::error::Error for OceanError {}

/// Which inverse transform turns frequency channels into spatial fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverKind {
    /// Direct O(N⁴) summation.  Only useful as a reference.
    BruteForce,
    /// Iterative radix-2 butterfly transform.
    #[default]
    Fft,
}

/// Physical and numerical parameters of one ocean patch.
///
/// Immutable once an [`OceanSimulation`](crate::simulation::OceanSimulation)
/// has been built from it; changing any field means building a new one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanConfig {
    /// Cells per side.  Rounded up to the next power of two.
    pub grid_size: usize,
    /// Side length of the square, tileable patch in world units.
    pub world_scale: f32,
    /// Wind velocity on the XZ plane.  Its length drives the largest wave size.
    pub wind: [f32; 2],
    /// Phillips spectrum amplitude constant.
    pub amplitude: f32,
    pub gravity: f32,
    /// Seconds after which the whole surface repeats exactly.
    pub repeat_period: f32,
    pub seed: u64,
    pub solver: SolverKind,
    /// Power of `k̂·ŵ` in the directional term.  Higher is more wind-aligned.
    pub wind_alignment_exponent: u32,
    /// Suppression length for small waves, as a fraction of the wind length.
    pub small_wave_damping: f32,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            grid_size: 32,
            world_scale: 64.0,
            wind: [32.0, 32.0],
            amplitude: 0.0002,
            gravity: 9.81,
            repeat_period: 200.0,
            seed: 0,
            solver: SolverKind::Fft,
            wind_alignment_exponent: 6,
            small_wave_damping: 0.001,
        }
    }
}

impl OceanConfig {
    /// Check every parameter, failing on the first invalid one.
    pub fn validate(&self) -> Result<(), OceanError> {
        if self.grid_size == 0 {
            return Err(OceanError::ZeroGridSize);
        }
        if self.grid_size < MIN_GRID_SIZE {
            return Err(OceanError::GridSizeTooSmall {
                size: self.grid_size,
                min: MIN_GRID_SIZE,
            });
        }
        let size = self.grid_size.next_power_of_two();
        if size > MAX_GRID_SIZE {
            return Err(OceanError::GridSizeTooLarge {
                size,
                max: MAX_GRID_SIZE,
            });
        }
        for (field, value) in [
            ("world_scale", self.world_scale),
            ("repeat_period", self.repeat_period),
            ("gravity", self.gravity),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(OceanError::NonPositive { field, value });
            }
        }
        if !self.wind.iter().all(|w| w.is_finite()) {
            return Err(OceanError::NonFiniteWind(self.wind));
        }
        if !(self.amplitude.is_finite() && self.amplitude >= 0.0) {
            return Err(OceanError::InvalidAmplitude(self.amplitude));
        }
        if self.small_wave_damping < 0.0 || !self.small_wave_damping.is_finite() {
            return Err(OceanError::NonPositive {
                field: "small_wave_damping",
                value: self.small_wave_damping,
            });
        }
        if self.wind_alignment_exponent % 2 != 0 {
            return Err(OceanError::OddWindExponent(self.wind_alignment_exponent));
        }
        if self.wind_alignment_exponent > MAX_WIND_EXPONENT {
            return Err(OceanError::WindExponentTooLarge {
                exponent: self.wind_alignment_exponent,
                max: MAX_WIND_EXPONENT,
            });
        }
        Ok(())
    }

    /// Grid size rounded up to the next power of two.
    ///
    /// Rounding is a correction, not a failure: a warning is logged and the
    /// larger size is used.
    pub fn resolved_grid_size(&self) -> usize {
        let size = self.grid_size.max(1).next_power_of_two();
        if size != self.grid_size {
            warn!(
                "ocean grid size {} is not a power of two, using {size}",
                self.grid_size
            );
        }
        size
    }

    /// World-space width of one grid cell.
    pub fn cell_size(&self) -> f32 {
        self.world_scale / self.grid_size.max(1) as f32
    }

    /// Fundamental angular frequency `2π / T`; every mode is a multiple of it.
    pub fn base_frequency(&self) -> f32 {
        std::f32::consts::TAU / self.repeat_period
    }
}

/// Parameters of an offline bake.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    /// Number of evenly spaced samples over one repeat period.
    pub frame_count: usize,
    /// Exponential decay rate (per second) of the foam history weights.
    pub foam_decay: f32,
    /// Resample every frame so horizontal displacement is baked out and the
    /// output only moves vertically.
    pub uv_correction: bool,
    /// Fixed-point iterations used to invert the horizontal displacement.
    pub uv_iterations: usize,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            frame_count: 64,
            foam_decay: 0.015,
            uv_correction: false,
            uv_iterations: 6,
        }
    }
}

impl BakeConfig {
    pub fn validate(&self) -> Result<(), OceanError> {
        if self.frame_count == 0 {
            return Err(OceanError::ZeroFrameCount);
        }
        if self.frame_count > MAX_FRAME_COUNT {
            return Err(OceanError::TooManyFrames {
                count: self.frame_count,
                max: MAX_FRAME_COUNT,
            });
        }
        if !(self.foam_decay.is_finite() && self.foam_decay > 0.0) {
            return Err(OceanError::NonPositive {
                field: "foam_decay",
                value: self.foam_decay,
            });
        }
        if self.uv_correction && self.uv_iterations == 0 {
            return Err(OceanError::ZeroUvIterations);
        }
        Ok(())
    }
}
