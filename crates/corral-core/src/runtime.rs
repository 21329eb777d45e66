//! Corral runtime.

use crate::config::Config;
use crate::error::Result;
use crate::supervisor::ProcessFactory;
use corral_container::registry::BusEvent;
use corral_container::{InteriorFactory, Registry};
use corral_error::CommonError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// How long shutdown waits for containers to drain to offline.
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// The Corral runtime: the registry plus its interior factories.
pub struct Runtime {
    /// Configuration.
    config: Config,
    /// Container registry.
    registry: Arc<Registry>,
}

impl Runtime {
    /// Creates a new runtime with the given configuration and the
    /// built-in interior factories.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    pub fn new(config: Config) -> Result<Self> {
        let registry = Arc::new(Registry::new(builtin_factories()));
        Ok(Self { config, registry })
    }

    /// Creates a runtime with a custom factory set. Used by embedders and
    /// tests that bring their own interiors.
    #[must_use]
    pub fn with_factories(
        config: Config,
        factories: impl IntoIterator<Item = Arc<dyn InteriorFactory>>,
    ) -> Self {
        Self {
            config,
            registry: Arc::new(Registry::new(factories)),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the container registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Subscribes to the container pub/sub bus.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.registry.subscribe()
    }

    /// Initializes the runtime: creates the data directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.data_dir)
            .await
            .map_err(CommonError::from)?;
        tracing::info!(data_dir = %self.config.data_dir.display(), "corral runtime initialized");
        Ok(())
    }

    /// Shuts down the runtime gracefully: destroys every container and
    /// waits for the registry to drain.
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown fails.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("corral runtime shutting down");

        for id in self.registry.list() {
            if let Err(e) = self.registry.destroy(&id) {
                tracing::warn!(id = %id, error = %e, "failed to destroy container on shutdown");
            }
        }

        let deadline = tokio::time::Instant::now() + SHUTDOWN_DRAIN_TIMEOUT;
        while !self.registry.list().is_empty() {
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(
                    remaining = self.registry.list().len(),
                    "containers did not reach offline before shutdown"
                );
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        tracing::info!("corral runtime shutdown complete");
        Ok(())
    }
}

/// The interior factories every runtime carries.
fn builtin_factories() -> Vec<Arc<dyn InteriorFactory>> {
    vec![Arc::new(ProcessFactory)]
}
