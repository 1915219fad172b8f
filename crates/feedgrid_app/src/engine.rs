//! Engine lifecycle: the object an embedder (or the bundled binary)
//! holds from init to shutdown.

use std::io;
use std::path::Path;

use thiserror::Error;

use feedgrid_core::{Config, ConfigError};

use crate::runtime::Dashboard;
use crate::widget::WidgetRegistry;

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start fetch pool: {0}")]
    FetchPool(io::Error),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("engine has been shut down")]
    ShutDown,
    #[error("terminal unavailable: {0}")]
    Terminal(io::Error),
    #[error("terminal io failed: {0}")]
    Io(io::Error),
}

/// Externally visible lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Created,
    Running,
    ShutDown,
}

/// Owns a dashboard from init to shutdown. `run` blocks; `shutdown` is
/// idempotent and releases everything the engine owns.
pub struct DashEngine {
    state: EngineState,
    dashboard: Option<Dashboard>,
}

impl std::fmt::Debug for DashEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashEngine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DashEngine {
    /// Build from a config file, or from the built-in default dashboard
    /// when no path is given.
    pub fn from_path(config_path: Option<&Path>) -> Result<Self, InitError> {
        let registry = WidgetRegistry::builtin();
        let config = match config_path {
            Some(path) => Config::load(path, &registry.kinds())?,
            None => Config::default(),
        };
        Self::with_registry(&config, &registry)
    }

    /// Build from config text instead of a file.
    pub fn from_toml_str(config_text: &str) -> Result<Self, InitError> {
        let registry = WidgetRegistry::builtin();
        let config = Config::from_toml_str(config_text, &registry.kinds())?;
        Self::with_registry(&config, &registry)
    }

    /// Build from an already validated config and a caller-supplied
    /// registry. This is the seam for embedders that register their own
    /// widget kinds.
    pub fn with_registry(config: &Config, registry: &WidgetRegistry) -> Result<Self, InitError> {
        let dashboard = Dashboard::new(config, registry)?;
        log::info!("engine initialized with {} widgets", dashboard.widgets().len());
        Ok(Self {
            state: EngineState::Created,
            dashboard: Some(dashboard),
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        self.dashboard.as_mut()
    }

    /// Run the render loop until the user quits or a fatal error ends
    /// it. Fails with `ShutDown` after `shutdown`; must not be called
    /// concurrently on the same engine.
    pub fn run(&mut self) -> Result<(), RunError> {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return Err(RunError::ShutDown);
        };
        self.state = EngineState::Running;
        let result = dashboard.run();
        if let Err(err) = &result {
            log::error!("render loop failed: {err}");
        }
        self.state = EngineState::Created;
        result
    }

    /// Release the dashboard, its widgets, and the fetch pool. Fetches
    /// still in flight are abandoned; their results are never
    /// delivered. Safe to call any number of times.
    pub fn shutdown(&mut self) {
        if self.dashboard.take().is_some() {
            log::info!("engine shut down");
        }
        self.state = EngineState::ShutDown;
    }
}
