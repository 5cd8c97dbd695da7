//! Application state for the simulation server.

use std::sync::Arc;

use qsimd_hal::SimulationBackend;
use qsimd_render::Renderer;
use tokio::sync::watch;

use crate::assembler::ResultAssembler;
use crate::config::Config;
use crate::dispatcher::JobDispatcher;

/// Shared application state.
///
/// Built once at startup from an immutable [`Config`].
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: JobDispatcher,
    pub assembler: ResultAssembler,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        backend: Arc<dyn SimulationBackend>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let dispatcher = JobDispatcher::new(backend, &config.limits, shutdown_rx);
        let assembler = ResultAssembler::new(renderer, config.limits.max_concurrent_jobs);
        Self {
            config,
            dispatcher,
            assembler,
            shutdown,
        }
    }

    /// Cancel outstanding jobs and refuse new ones.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}
