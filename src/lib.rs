//! `bevy_symbios_ocean`: spectral ocean surface synthesis for Bevy.
//!
//! # Architecture
//! An [`OceanSimulation`] draws a Phillips wave spectrum once from a seed,
//! then evaluates the surface at any time `t` through an inverse 2-D Fourier
//! transform ([`SolverKind::Fft`] or the [`SolverKind::BruteForce`] reference).
//! Each evaluation yields heights, choppy horizontal offsets and normals as a
//! [`SpatialField`], or as a seam-free `(N+1)²` [`VertexGrid`] ready for upload.
//!
//! Wave frequencies are quantised to multiples of `2π/T`, so the surface
//! repeats exactly after the configured period.  [`bake`](bake::bake) samples
//! one such period into frames, adds temporally smoothed foam, and
//! [`format`] writes them to the binary bake file.
//!
//! For interactive use, [`LiveOcean`] evaluates in the background and
//! [`SymbiosOceanPlugin`] keeps its [`OceanSurface`] current.

pub mod bake;
pub mod config;
pub mod field;
pub mod foam;
pub mod format;
pub mod fourier;
pub mod live;
pub mod simulation;
pub mod spectrum;
pub mod wave;

pub use bake::{BakedFrame, FrameBakeSet};
pub use config::{BakeConfig, OceanConfig, OceanError, SolverKind};
pub use field::{OceanVertex, SpatialField, VertexGrid, triangle_indices};
pub use format::FormatError;
pub use fourier::FourierSolver;
pub use live::{LiveEvaluator, LiveOcean, OceanSurface};
pub use simulation::OceanSimulation;

use bevy::prelude::*;

/// Bevy plugin: registers the live evaluation system.
pub struct SymbiosOceanPlugin;

impl Plugin for SymbiosOceanPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, live::drive_live_oceans);
    }
}
