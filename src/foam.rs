//! Whitecap foam from horizontal displacement, and its temporal smoothing.
//!
//! Where the choppy displacement squeezes the surface together the mapping
//! `p(x) = x + D(x)` folds, and the Jacobian determinant of `p` drops below
//! one.  `1 − det J` (clamped at zero) is used as the raw foam amount.
//!
//! Raw foam flickers from frame to frame, so each baked frame is replaced by
//! an exponentially weighted average of its history.  The bake covers exactly
//! one repeat period, so the history wraps around the frame ring and the
//! first frame is as smooth as the last.

use rayon::prelude::*;

/// Raw foam for one `size×size` field of horizontal displacements.
///
/// Derivatives are one-sided differences towards the `+x` and `+z`
/// neighbours, wrapping at the border.  Comparing neighbour offsets directly
/// (plus one cell of rest-position spacing) keeps the wrap from introducing a
/// jump of a whole patch width.
pub fn jacobian_foam(displacements: &[[f32; 2]], size: usize, cell_size: f32) -> Vec<f32> {
    assert_eq!(displacements.len(), size * size, "field must be size×size");
    let mut foam = Vec::with_capacity(size * size);
    for z in 0..size {
        for x in 0..size {
            let here = displacements[x + z * size];
            let right = displacements[(x + 1) % size + z * size];
            let down = displacements[x + ((z + 1) % size) * size];

            let jxx = (cell_size + right[0] - here[0]) / cell_size;
            let jzx = (right[1] - here[1]) / cell_size;
            let jxz = (down[0] - here[0]) / cell_size;
            let jzz = (cell_size + down[1] - here[1]) / cell_size;

            let det = jxx * jzz - jxz * jzx;
            foam.push((1.0 - det).max(0.0));
        }
    }
    foam
}

/// Exponential weight of a sample `lag` frames in the past.
#[inline]
fn history_weight(lag: usize, frame_dt: f32, decay: f32) -> f32 {
    (-decay * lag as f32 * frame_dt).exp()
}

/// Smooth a ring of per-frame foam fields over time.
///
/// `smoothed[f] = Σᵢ raw[(f − i) mod F] · w(i) / Σᵢ w(i)` for `i` in
/// `0..F`, with `w(i) = exp(−decay · i · frame_dt)`.  Being a convex
/// combination, no output exceeds the largest raw value.
pub fn smooth_temporal(raw: &[Vec<f32>], frame_dt: f32, decay: f32) -> Vec<Vec<f32>> {
    let frames = raw.len();
    if frames == 0 {
        return Vec::new();
    }
    let cells = raw[0].len();
    let weights: Vec<f32> = (0..frames)
        .map(|lag| history_weight(lag, frame_dt, decay))
        .collect();
    let total: f32 = weights.iter().sum();

    (0..frames)
        .into_par_iter()
        .map(|f| {
            let mut acc = vec![0.0f32; cells];
            for (lag, &w) in weights.iter().enumerate() {
                let src = &raw[(f + frames - lag) % frames];
                for (a, &v) in acc.iter_mut().zip(src) {
                    *a += v * w;
                }
            }
            for a in &mut acc {
                *a /= total;
            }
            acc
        })
        .collect()
}
