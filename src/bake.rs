//! Offline baking of one full repeat period into per-frame texel arrays.
//!
//! Frames are sampled at `tᵢ = i·T/F` for `i` in `0..F` and evaluated in
//! parallel; they share nothing but the read-only spectrum.  Foam needs every
//! frame before it can be smoothed, so baking blocks until all are done.
//!
//! The frame set is a ring in time: frame `F` is frame `0` again, which is why
//! [`FrameBakeSet::frame`] wraps its index.

use bevy::log::debug;
use rayon::prelude::*;

use crate::{
    config::{BakeConfig, OceanError},
    field::{SpatialField, normalize},
    foam::{jacobian_foam, smooth_temporal},
    simulation::OceanSimulation,
};

/// Texel arrays of one baked frame, each `N×N`, row-major `x + z·N`.
#[derive(Clone, Debug, PartialEq)]
pub struct BakedFrame {
    /// `(dx, height, dz)` offset from the rest position.
    pub displacement: Vec<[f32; 3]>,
    pub normal: Vec<[f32; 3]>,
    pub foam: Vec<f32>,
}

impl BakedFrame {
    fn from_field(field: SpatialField, foam: Vec<f32>) -> Self {
        let displacement = field
            .displacements
            .iter()
            .zip(&field.heights)
            .map(|(d, &h)| [d[0], h, d[1]])
            .collect();
        Self {
            displacement,
            normal: field.normals,
            foam,
        }
    }
}

/// The baked frame ring.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBakeSet {
    pub grid_size: usize,
    pub frames: Vec<BakedFrame>,
}

impl FrameBakeSet {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame `index`, wrapping around the ring.
    ///
    /// # Panics
    /// If the set is empty.
    pub fn frame(&self, index: usize) -> &BakedFrame {
        &self.frames[index % self.frames.len()]
    }

    /// Frame shown at time `t` when the set spans `period` seconds.
    pub fn frame_at(&self, t: f32, period: f32) -> &BakedFrame {
        let frames = self.frames.len() as f32;
        let i = (t.rem_euclid(period) / period * frames).floor() as usize;
        self.frame(i)
    }
}

/// Bake one repeat period of `sim`.
pub fn bake(sim: &OceanSimulation, config: &BakeConfig) -> Result<FrameBakeSet, OceanError> {
    config.validate()?;
    let ocean = sim.config();
    let n = sim.grid_size();
    let cell = ocean.cell_size();
    let frame_dt = ocean.repeat_period / config.frame_count as f32;
    debug!(
        "baking {} frames of {n}×{n} over {}s",
        config.frame_count, ocean.repeat_period
    );

    let fields: Vec<SpatialField> = (0..config.frame_count)
        .into_par_iter()
        .map(|i| sim.evaluate_field(i as f32 * frame_dt))
        .collect();

    let raw_foam: Vec<Vec<f32>> = fields
        .par_iter()
        .map(|f| jacobian_foam(&f.displacements, n, cell))
        .collect();
    let foam = smooth_temporal(&raw_foam, frame_dt, config.foam_decay);

    let mut frames: Vec<BakedFrame> = fields
        .into_iter()
        .zip(foam)
        .map(|(field, foam)| BakedFrame::from_field(field, foam))
        .collect();

    if config.uv_correction {
        frames = frames
            .par_iter()
            .map(|f| uv_correct(f, n, ocean.world_scale, config.uv_iterations))
            .collect();
    }
    debug!("bake finished");

    Ok(FrameBakeSet {
        grid_size: n,
        frames,
    })
}

/// Four texel indices and weights for bilinear sampling at texel-space
/// coordinate `(u, v)`, wrapping at every edge.
fn bilinear_taps(size: usize, u: f32, v: f32) -> [(usize, f32); 4] {
    let x0 = u.floor();
    let z0 = v.floor();
    let fx = u - x0;
    let fz = v - z0;
    let s = size as i64;
    let xa = (x0 as i64).rem_euclid(s) as usize;
    let za = (z0 as i64).rem_euclid(s) as usize;
    let xb = (xa + 1) % size;
    let zb = (za + 1) % size;
    [
        (xa + za * size, (1.0 - fx) * (1.0 - fz)),
        (xb + za * size, fx * (1.0 - fz)),
        (xa + zb * size, (1.0 - fx) * fz),
        (xb + zb * size, fx * fz),
    ]
}

fn sample3(values: &[[f32; 3]], taps: &[(usize, f32); 4]) -> [f32; 3] {
    taps.iter().fold([0.0; 3], |acc, &(i, w)| {
        [
            acc[0] + values[i][0] * w,
            acc[1] + values[i][1] * w,
            acc[2] + values[i][2] * w,
        ]
    })
}

/// Resample `frame` so the horizontal displacement is baked out.
///
/// For every texel the source UV whose displaced position lands on the
/// texel's rest position is found by fixed-point iteration,
///
///   uv ← (world − D(uv)) / world_scale,   starting at uv = world / world_scale,
///
/// then height, normal and foam are read there.  The output displacement is
/// purely vertical: `(0, h, 0)`.
pub fn uv_correct(
    frame: &BakedFrame,
    size: usize,
    world_scale: f32,
    iterations: usize,
) -> BakedFrame {
    let cell = world_scale / size as f32;
    let texels = size as f32;
    let mut displacement = Vec::with_capacity(size * size);
    let mut normal = Vec::with_capacity(size * size);
    let mut foam = Vec::with_capacity(size * size);

    for z in 0..size {
        for x in 0..size {
            let world = [x as f32 * cell, z as f32 * cell];
            let mut uv = [world[0] / world_scale, world[1] / world_scale];
            for _ in 0..iterations {
                let taps = bilinear_taps(size, uv[0] * texels, uv[1] * texels);
                let d = sample3(&frame.displacement, &taps);
                uv = [(world[0] - d[0]) / world_scale, (world[1] - d[2]) / world_scale];
            }
            let taps = bilinear_taps(size, uv[0] * texels, uv[1] * texels);
            let d = sample3(&frame.displacement, &taps);
            displacement.push([0.0, d[1], 0.0]);
            normal.push(normalize(sample3(&frame.normal, &taps)));
            foam.push(taps.iter().map(|&(i, w)| frame.foam[i] * w).sum());
        }
    }

    BakedFrame {
        displacement,
        normal,
        foam,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OceanConfig;

    fn sim(amplitude: f32) -> OceanSimulation {
        OceanSimulation::new(OceanConfig {
            grid_size: 16,
            amplitude,
            repeat_period: 20.0,
            ..OceanConfig::default()
        })
        .expect("valid config")
    }

    #[test]
    fn bake_produces_frame_count_frames() {
        let set = bake(
            &sim(0.0002),
            &BakeConfig {
                frame_count: 8,
                ..BakeConfig::default()
            },
        )
        .expect("bake");
        assert_eq!(set.frame_count(), 8);
        assert_eq!(set.grid_size, 16);
        for frame in &set.frames {
            assert_eq!(frame.displacement.len(), 256);
            assert_eq!(frame.normal.len(), 256);
            assert_eq!(frame.foam.len(), 256);
            assert!(frame.foam.iter().all(|&f| f >= 0.0));
        }
    }

    #[test]
    fn frames_match_direct_evaluation() {
        let s = sim(0.0002);
        let set = bake(
            &s,
            &BakeConfig {
                frame_count: 4,
                ..BakeConfig::default()
            },
        )
        .expect("bake");
        let field = s.evaluate_field(2.0 * 20.0 / 4.0);
        let frame = set.frame(2);
        for (i, d) in frame.displacement.iter().enumerate() {
            assert_eq!(d[1], field.heights[i]);
            assert_eq!(d[0], field.displacements[i][0]);
            assert_eq!(d[2], field.displacements[i][1]);
        }
    }

    #[test]
    fn frame_index_wraps() {
        let set = bake(
            &sim(0.0002),
            &BakeConfig {
                frame_count: 3,
                ..BakeConfig::default()
            },
        )
        .expect("bake");
        assert_eq!(set.frame(3), set.frame(0));
        assert_eq!(set.frame(7), set.frame(1));
        assert_eq!(set.frame_at(20.0, 20.0), set.frame(0));
        assert_eq!(set.frame_at(-1.0, 20.0), set.frame(2));
    }

    #[test]
    fn calm_sea_bakes_flat() {
        let set = bake(
            &sim(0.0),
            &BakeConfig {
                frame_count: 4,
                uv_correction: true,
                ..BakeConfig::default()
            },
        )
        .expect("bake");
        for frame in &set.frames {
            assert!(frame.displacement.iter().all(|d| d.iter().all(|&c| c == 0.0)));
            assert!(frame.normal.iter().all(|n| *n == [0.0, 1.0, 0.0]));
            assert!(frame.foam.iter().all(|&f| f == 0.0));
        }
    }

    #[test]
    fn rejects_zero_frames() {
        let err = bake(
            &sim(0.0002),
            &BakeConfig {
                frame_count: 0,
                ..BakeConfig::default()
            },
        )
        .unwrap_err();
        assert_eq!(err, OceanError::ZeroFrameCount);
    }

    #[test]
    fn uv_correction_removes_horizontal_offsets() {
        let s = sim(0.0002);
        let set = bake(
            &s,
            &BakeConfig {
                frame_count: 2,
                uv_correction: true,
                ..BakeConfig::default()
            },
        )
        .expect("bake");
        for frame in &set.frames {
            assert!(frame.displacement.iter().all(|d| d[0] == 0.0 && d[2] == 0.0));
            for n in &frame.normal {
                let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
                assert!((len - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn uv_correction_inverts_a_constant_shift() {
        // Every sample is pushed one cell along +x, so the texel at x reads
        // the height that started at x − 1.
        let size = 8;
        let world_scale = 8.0;
        let displacement: Vec<[f32; 3]> = (0..size * size)
            .map(|i| [1.0, (i % size) as f32, 0.0])
            .collect();
        let frame = BakedFrame {
            displacement,
            normal: vec![[0.0, 1.0, 0.0]; size * size],
            foam: vec![0.0; size * size],
        };
        let out = uv_correct(&frame, size, world_scale, 6);
        for z in 0..size {
            for x in 0..size {
                let expected = ((x + size - 1) % size) as f32;
                let got = out.displacement[x + z * size][1];
                assert!((got - expected).abs() < 1e-4, "({x},{z}): {got} vs {expected}");
            }
        }
    }

    #[test]
    fn bilinear_taps_wrap_and_sum_to_one() {
        let taps = bilinear_taps(4, 3.5, -0.25);
        let total: f32 = taps.iter().map(|t| t.1).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(taps.iter().all(|t| t.0 < 16));
        assert_eq!(taps[0].0, 3 + 3 * 4);
        assert_eq!(taps[1].0, 12);
    }
}
