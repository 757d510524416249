//! The ocean simulation instance: spectrum, solver and configuration.

use bevy::log::debug;

use crate::{
    config::{BakeConfig, OceanConfig, OceanError},
    field::{FrequencyField, SpatialField, VertexGrid},
    fourier::{FourierSolver, Solver},
    spectrum::SpectrumGrid,
};

/// An immutable, thread-safe ocean patch.
///
/// Construction generates the spectrum and picks the solver; evaluation only
/// reads them, so one instance can be shared (e.g. behind an `Arc`) by any
/// number of evaluating threads.
#[derive(Clone, Debug)]
pub struct OceanSimulation {
    config: OceanConfig,
    spectrum: SpectrumGrid,
    solver: Solver,
}

impl OceanSimulation {
    /// Validate `config`, round its grid size up to a power of two and build
    /// the spectrum from `config.seed`.
    pub fn new(mut config: OceanConfig) -> Result<Self, OceanError> {
        config.validate()?;
        config.grid_size = config.resolved_grid_size();
        let spectrum = SpectrumGrid::from_seed(&config);
        let solver = Solver::new(config.solver, config.grid_size);
        debug!(
            "ocean simulation ready: N={}, scale={}, solver={:?}",
            config.grid_size, config.world_scale, config.solver
        );
        Ok(Self {
            config,
            spectrum,
            solver,
        })
    }

    /// Configuration in effect, with the grid size already rounded.
    pub fn config(&self) -> &OceanConfig {
        &self.config
    }

    pub fn spectrum(&self) -> &SpectrumGrid {
        &self.spectrum
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn grid_size(&self) -> usize {
        self.config.grid_size
    }

    /// Sample the surface at time `t` on the `N×N` grid.
    pub fn evaluate_field(&self, t: f32) -> SpatialField {
        let freq = FrequencyField::build(&self.spectrum, t);
        debug_assert_eq!(freq.size, self.solver.size());
        SpatialField::from_frequency(&freq, &self.solver, self.config.cell_size(), t)
    }

    /// Sample the surface at time `t` as a tileable vertex grid.
    pub fn evaluate(&self, t: f32) -> VertexGrid {
        VertexGrid::from_field(&self.evaluate_field(t))
    }

    /// Bake one full repeat period.  See [`crate::bake::bake`].
    pub fn bake(&self, config: &BakeConfig) -> Result<crate::bake::FrameBakeSet, OceanError> {
        crate::bake::bake(self, config)
    }
}
