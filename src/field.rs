//! Field assembly: frequency channels → spatial field → tileable vertex grid.
//!
//! For each mode with wave factor `c` and wave vector `k`:
//!
//!   height       = c
//!   slope        = i·k·c            (x and z packed in one pair)
//!   displacement = i·(−k/|k|)·c     (zero when |k| is vanishingly small)
//!
//! After the inverse transform the real parts give, per cell, the height, the
//! surface gradient and the horizontal (choppy) displacement.

use bytemuck::{Pod, Zeroable};
use num_complex::Complex32;

use crate::{
    fourier::{FourierSolver, PackedPair, ZERO_PAIR},
    spectrum::{SPECTRUM_EPSILON, SpectrumGrid},
};

/// Sign applied to the transformed displacement channel.
const DISPLACEMENT_SIGN: f32 = -1.0;

/// Frequency-domain channels for one instant.  Rebuilt for every evaluation.
#[derive(Clone, Debug)]
pub struct FrequencyField {
    pub size: usize,
    /// Height in channel 0, channel 1 unused.
    pub height: Vec<PackedPair>,
    /// Slope x in channel 0, slope z in channel 1.
    pub slope: Vec<PackedPair>,
    /// Displacement x in channel 0, displacement z in channel 1.
    pub displacement: Vec<PackedPair>,
}

impl FrequencyField {
    /// Evaluate every mode of `spectrum` at time `t`.
    pub fn build(spectrum: &SpectrumGrid, t: f32) -> Self {
        let n = spectrum.size();
        let mut height = vec![ZERO_PAIR; n * n];
        let mut slope = vec![ZERO_PAIR; n * n];
        let mut displacement = vec![ZERO_PAIR; n * n];

        for m in 0..n {
            for col in 0..n {
                let idx = col + m * n;
                let c = spectrum.wave_factor(t, col, m);
                let [kx, kz] = spectrum.wave_vector(col, m);
                let ic = c * Complex32::i();

                height[idx][0] = c;
                slope[idx] = [ic * kx, ic * kz];

                let len = (kx * kx + kz * kz).sqrt();
                if len >= SPECTRUM_EPSILON {
                    displacement[idx] = [ic * (-kx / len), ic * (-kz / len)];
                }
            }
        }

        Self {
            size: n,
            height,
            slope,
            displacement,
        }
    }
}

/// Spatial surface on the `N×N` sample grid, row-major `x + z·N`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialField {
    pub size: usize,
    /// World-space width of one cell.
    pub cell_size: f32,
    /// Simulation time the field was sampled at.
    pub time: f32,
    pub heights: Vec<f32>,
    /// Horizontal world-space offset `(dx, dz)` of each sample.
    pub displacements: Vec<[f32; 2]>,
    /// Unit surface normals.
    pub normals: Vec<[f32; 3]>,
}

impl SpatialField {
    /// Transform `freq` with `solver` and derive heights, offsets and normals.
    pub fn from_frequency<S: FourierSolver + ?Sized>(
        freq: &FrequencyField,
        solver: &S,
        cell_size: f32,
        time: f32,
    ) -> Self {
        let height = solver.transform(&freq.height);
        let slope = solver.transform(&freq.slope);
        let displacement = solver.transform(&freq.displacement);

        let heights = height.iter().map(|h| h[0].re).collect();
        let displacements = displacement
            .iter()
            .map(|d| [DISPLACEMENT_SIGN * d[0].re, DISPLACEMENT_SIGN * d[1].re])
            .collect();
        let normals = slope
            .iter()
            .map(|s| normalize([-s[0].re, 1.0, -s[1].re]))
            .collect();

        Self {
            size: freq.size,
            cell_size,
            time,
            heights,
            displacements,
            normals,
        }
    }

    /// Rest position of sample `(x, z)` before displacement.
    #[inline]
    pub fn origin(&self, x: usize, z: usize) -> [f32; 2] {
        [x as f32 * self.cell_size, z as f32 * self.cell_size]
    }

    /// Displaced world position of sample `(x, z)`; indices wrap.
    pub fn position(&self, x: usize, z: usize) -> [f32; 3] {
        let idx = (x % self.size) + (z % self.size) * self.size;
        let [ox, oz] = self.origin(x, z);
        let [dx, dz] = self.displacements[idx];
        [ox + dx, self.heights[idx], oz + dz]
    }
}

/// Normalise `v`, falling back to straight up for a zero vector.
#[inline]
pub(crate) fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len <= f32::EPSILON {
        return [0.0, 1.0, 0.0];
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

/// GPU-ready vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct OceanVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// `(N+1)×(N+1)` tileable vertex grid, row-major `j + i·(N+1)`.
///
/// Row and column `N` repeat row and column 0 shifted by one patch width
/// (`N·cell`), so neighbouring copies of the patch meet without a seam.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexGrid {
    pub size: usize,
    pub time: f32,
    pub vertices: Vec<OceanVertex>,
}

impl VertexGrid {
    pub fn from_field(field: &SpatialField) -> Self {
        let n = field.size;
        let stride = n + 1;
        let mut vertices = Vec::with_capacity(stride * stride);
        for i in 0..stride {
            for j in 0..stride {
                let src = (j % n) + (i % n) * n;
                vertices.push(OceanVertex {
                    position: field.position(j, i),
                    normal: field.normals[src],
                    uv: [j as f32 / n as f32, i as f32 / n as f32],
                });
            }
        }
        Self {
            size: n,
            time: field.time,
            vertices,
        }
    }

    pub fn vertex(&self, j: usize, i: usize) -> &OceanVertex {
        &self.vertices[j + i * (self.size + 1)]
    }

    pub fn heights(&self) -> impl Iterator<Item = f32> + '_ {
        self.vertices.iter().map(|v| v.position[1])
    }

    /// Raw vertex bytes for direct buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Triangle list for an `N×N` cell grid, two counter-clockwise triangles per cell.
pub fn triangle_indices(size: usize) -> Vec<u32> {
    let stride = size + 1;
    let mut indices = Vec::with_capacity(size * size * 6);
    for i in 0..size {
        for j in 0..size {
            let a = (i * stride + j) as u32;
            let below = ((i + 1) * stride + j) as u32;
            indices.extend_from_slice(&[a, below, below + 1, a, below + 1, a + 1]);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OceanConfig;
    use crate::fourier::ButterflyFft;

    fn field(config: &OceanConfig, t: f32) -> SpatialField {
        let spectrum = SpectrumGrid::from_seed(config);
        let freq = FrequencyField::build(&spectrum, t);
        let solver = ButterflyFft::new(spectrum.size());
        SpatialField::from_frequency(&freq, &solver, config.cell_size(), t)
    }

    #[test]
    fn zero_amplitude_is_flat() {
        let config = OceanConfig {
            grid_size: 8,
            amplitude: 0.0,
            ..OceanConfig::default()
        };
        for t in [0.0, 3.5, 100.0] {
            let f = field(&config, t);
            assert!(f.heights.iter().all(|&h| h == 0.0));
            assert!(f.displacements.iter().all(|d| d[0] == 0.0 && d[1] == 0.0));
            assert!(f.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
            let grid = VertexGrid::from_field(&f);
            assert_eq!(grid.heights().count(), 9 * 9);
            assert!(grid.heights().all(|h| h == 0.0));
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let f = field(&OceanConfig::default(), 12.0);
        for n in &f.normals {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
            assert!(n[1] > 0.0, "normals point up");
        }
    }

    #[test]
    fn displacement_is_zero_at_centre_mode() {
        let spectrum = SpectrumGrid::from_seed(&OceanConfig::default());
        let freq = FrequencyField::build(&spectrum, 5.0);
        let c = spectrum.size() / 2;
        assert_eq!(freq.displacement[c + c * spectrum.size()], ZERO_PAIR);
    }

    #[test]
    fn surface_is_not_flat_with_wind() {
        let f = field(&OceanConfig::default(), 7.0);
        let max = f.heights.iter().fold(0.0f32, |a, h| a.max(h.abs()));
        assert!(max > 0.0);
    }

    #[test]
    fn border_vertices_repeat_the_first_row_and_column() {
        let config = OceanConfig::default();
        let f = field(&config, 9.0);
        let grid = VertexGrid::from_field(&f);
        let n = grid.size;
        let offset = n as f32 * config.cell_size();
        assert_eq!(grid.vertices.len(), (n + 1) * (n + 1));
        for k in 0..=n {
            let first = grid.vertex(0, k % n);
            let last = grid.vertex(n, k % n);
            assert_eq!(last.normal, first.normal);
            assert_eq!(last.position[1], first.position[1]);
            assert!((last.position[0] - first.position[0] - offset).abs() < 1e-3);
            assert_eq!(last.position[2], first.position[2]);

            let top = grid.vertex(k % n, 0);
            let bottom = grid.vertex(k % n, n);
            assert_eq!(bottom.position[1], top.position[1]);
            assert!((bottom.position[2] - top.position[2] - offset).abs() < 1e-3);
        }
        let corner = grid.vertex(n, n);
        let origin = grid.vertex(0, 0);
        assert_eq!(corner.normal, origin.normal);
        assert_eq!(corner.uv, [1.0, 1.0]);
    }

    #[test]
    fn index_buffer_covers_every_cell() {
        let indices = triangle_indices(4);
        assert_eq!(indices.len(), 4 * 4 * 6);
        assert_eq!(&indices[..6], &[0, 5, 6, 0, 6, 1]);
        assert!(indices.iter().all(|&i| i < 25));
    }

    #[test]
    fn vertex_bytes_match_layout() {
        let grid = VertexGrid::from_field(&field(&OceanConfig::default(), 0.0));
        assert_eq!(grid.as_bytes().len(), grid.vertices.len() * 32);
    }
}
