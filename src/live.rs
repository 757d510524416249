//! Live surface evaluation off the main thread.
//!
//! One evaluation may be in flight per [`LiveEvaluator`].  A request made
//! while the previous one is still running is dropped, not queued, so a slow
//! machine shows a lower surface update rate rather than an ever-growing
//! backlog.  Finished grids are handed over whole as an [`Arc`] snapshot; the
//! consumer never sees a grid that is still being written.
//!
//! # Usage
//! ```rust,ignore
//! let sim = OceanSimulation::new(OceanConfig::default())?;
//! commands.spawn(LiveOcean::new(sim));
//! // drive_live_oceans inserts OceanSurface once the first grid lands.
//! ```

use std::sync::{Arc, Mutex, OnceLock, PoisonError, mpsc};

use bevy::{
    ecs::{
        component::Component,
        entity::Entity,
        system::{Commands, Query, Res},
    },
    log::error,
    time::Time,
};

use crate::{field::VertexGrid, simulation::OceanSimulation};

/// Maximum number of live evaluations that run concurrently across all
/// evaluators.  Further requests wait inside the pool.
const MAX_EVALUATION_THREADS: usize = 2;

/// Library-private pool for live evaluations, kept apart from the global
/// rayon pool that the transforms themselves fan out on.
fn eval_pool() -> Option<&'static rayon::ThreadPool> {
    static POOL: OnceLock<Option<rayon::ThreadPool>> = OnceLock::new();
    POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(MAX_EVALUATION_THREADS)
            .thread_name(|i| format!("ocean-eval-{i}"))
            .build()
            .map_err(|e| error!("failed to build ocean evaluation pool: {e}"))
            .ok()
    })
    .as_ref()
}

/// Single-slot background evaluator for one simulation.
pub struct LiveEvaluator {
    simulation: Arc<OceanSimulation>,
    // Wrapped in Mutex so the struct is Sync, which Bevy's Component bound requires.
    pending: Option<Mutex<mpsc::Receiver<VertexGrid>>>,
    latest: Option<Arc<VertexGrid>>,
}

impl LiveEvaluator {
    pub fn new(simulation: OceanSimulation) -> Self {
        Self::shared(Arc::new(simulation))
    }

    /// Evaluator over a simulation that is also used elsewhere.
    pub fn shared(simulation: Arc<OceanSimulation>) -> Self {
        Self {
            simulation,
            pending: None,
            latest: None,
        }
    }

    pub fn simulation(&self) -> &Arc<OceanSimulation> {
        &self.simulation
    }

    /// `true` when no evaluation is in flight.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Start evaluating the surface at time `t`.
    ///
    /// Returns `false` and does nothing if an evaluation is already running.
    pub fn request(&mut self, t: f32) -> bool {
        if !self.is_idle() {
            return false;
        }
        let (tx, rx) = mpsc::sync_channel(1);
        let simulation = Arc::clone(&self.simulation);
        let job = move || {
            tx.send(simulation.evaluate(t)).ok();
        };
        match eval_pool() {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
        self.pending = Some(Mutex::new(rx));
        true
    }

    /// Collect a finished evaluation, if any, without blocking.
    ///
    /// Returns the newly published grid, or `None` when nothing new arrived.
    pub fn poll(&mut self) -> Option<Arc<VertexGrid>> {
        let rx = self.pending.as_mut()?;
        let received = rx
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .try_recv();
        match received {
            Ok(grid) => {
                self.pending = None;
                let grid = Arc::new(grid);
                self.latest = Some(Arc::clone(&grid));
                Some(grid)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                error!("ocean evaluation thread panicked");
                self.pending = None;
                None
            }
        }
    }

    /// Most recently published grid.
    pub fn latest(&self) -> Option<&Arc<VertexGrid>> {
        self.latest.as_ref()
    }
}

/// Attach to an entity to keep its surface evaluated at the app's elapsed time.
#[derive(Component)]
pub struct LiveOcean(pub LiveEvaluator);

impl LiveOcean {
    pub fn new(simulation: OceanSimulation) -> Self {
        Self(LiveEvaluator::new(simulation))
    }
}

/// Latest surface of a [`LiveOcean`], replaced whenever a new grid lands.
#[derive(Component, Clone)]
pub struct OceanSurface(pub Arc<VertexGrid>);

/// Bevy system: publishes finished grids and requests the next one.
pub fn drive_live_oceans(
    mut commands: Commands,
    time: Res<Time>,
    mut oceans: Query<(Entity, &mut LiveOcean)>,
) {
    let now = time.elapsed_secs();
    for (entity, mut ocean) in &mut oceans {
        if let Some(grid) = ocean.0.poll() {
            commands.entity(entity).insert(OceanSurface(grid));
        }
        ocean.0.request(now);
    }
}
