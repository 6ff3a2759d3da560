// src/lib.rs

//! Browser-environment utilities for embedded web components:
//!
//! - [`watch`]: wait for an element matching a selector to appear in a
//!   document or container, resolving exactly once.
//! - [`url`]: build outbound API URLs with environment query parameters.
//! - [`telemetry`]: forward interaction events to an analytics sink.
//!
//! The [`dom`] module provides the in-memory document the watcher runs
//! against: node tree, selector engine and mutation observers.

pub mod config;
pub mod dom;
pub mod errors;
pub mod logging;
pub mod telemetry;
pub mod url;
pub mod watch;

pub use dom::{Document, NodeId};
pub use errors::{DomWatchError, Result};
pub use telemetry::{send_telemetry, AnalyticsSink, PageActionOverrides, TracingSink};
pub use url::{build_url, DataConnector, QueryParams};
pub use watch::{wait_for_element, ElementWatcher, WatchRequest, WatchState};

use tracing::debug;

use crate::config::{load_and_validate, ConfigFile};

/// Loaded configuration plus the collaborators built from it.
#[derive(Debug, Clone)]
pub struct Environment {
    pub config: ConfigFile,
    pub data_connector: DataConnector,
}

impl Environment {
    pub fn from_config(config: ConfigFile) -> Self {
        let data_connector = DataConnector::from_config(&config);
        Self {
            config,
            data_connector,
        }
    }

    /// Load and validate a config file, then initialise logging from its
    /// `[logging]` section.
    ///
    /// Logging initialisation failures (e.g. a subscriber is already
    /// installed) are not fatal.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config = load_and_validate(path)?;
        if let Err(err) = logging::init_logging(config.logging.level) {
            debug!(error = %err, "keeping existing tracing subscriber");
        }
        Ok(Self::from_config(config))
    }
}
