//! The container registry.
//!
//! Maps container ids to lifecycle engines, forwards engine events onto
//! the pub/sub broadcast bus, and evicts an engine once it reaches its
//! terminal `offline` state after a destroy request. The registry's id
//! map is the only state shared across engines.

use crate::config::ContainerConfig;
use crate::engine::{Engine, EngineEvent, Snapshot};
use crate::error::{ContainerError, Result};
use crate::interior::{ActionOpts, InteriorFactory};
use crate::state::{ContainerId, ContainerState, StableState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, mpsc};

/// Capacity of the pub/sub broadcast channel.
const BUS_CAPACITY: usize = 256;

/// Events broadcast on the registry's pub/sub bus.
///
/// These are the wire payloads: `container.state`, `container.status`,
/// and `container.error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum BusEvent {
    /// A container changed state.
    #[serde(rename = "container.state", rename_all = "camelCase")]
    State {
        /// Container id.
        id: String,
        /// The new state.
        state: ContainerState,
        /// The previous state.
        last_state: ContainerState,
    },
    /// A container reported a backend status payload.
    #[serde(rename = "container.status")]
    Status {
        /// Container id.
        id: String,
        /// Backend-defined payload.
        status: Value,
    },
    /// A container surfaced a transition failure or interior error.
    #[serde(rename = "container.error", rename_all = "camelCase")]
    Error {
        /// Container id.
        id: String,
        /// Human-readable message.
        message: String,
        /// For transition failures: the expectation that was violated.
        #[serde(skip_serializing_if = "Option::is_none")]
        expectation: Option<StableState>,
        /// For transition failures: the state the interior reported.
        #[serde(skip_serializing_if = "Option::is_none")]
        actual: Option<StableState>,
        /// For transition failures: the accepted path.
        #[serde(skip_serializing_if = "Option::is_none")]
        accepts: Option<Vec<ContainerState>>,
    },
}

impl BusEvent {
    fn error(id: &ContainerId, err: &ContainerError) -> Self {
        match err {
            ContainerError::TransitionFailed {
                expectation,
                actual,
                accepts,
            } => Self::Error {
                id: id.to_string(),
                message: err.to_string(),
                expectation: Some(*expectation),
                actual: Some(*actual),
                accepts: Some(accepts.clone()),
            },
            other => Self::Error {
                id: id.to_string(),
                message: other.to_string(),
                expectation: None,
                actual: None,
                accepts: None,
            },
        }
    }
}

struct EngineEntry {
    engine: Engine,
    /// Set by `destroy`; the forwarder evicts the entry when the engine
    /// subsequently settles at offline. Cleared by `start` and `stop` so
    /// a failure-latched offline engine stays listed and restartable.
    destroying: Arc<AtomicBool>,
}

/// Container registry.
pub struct Registry {
    engines: RwLock<HashMap<ContainerId, EngineEntry>>,
    factories: HashMap<&'static str, Arc<dyn InteriorFactory>>,
    bus: broadcast::Sender<BusEvent>,
}

impl Registry {
    /// Creates a registry with the given interior factories.
    #[must_use]
    pub fn new(factories: impl IntoIterator<Item = Arc<dyn InteriorFactory>>) -> Self {
        let (bus, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            engines: RwLock::new(HashMap::new()),
            factories: factories.into_iter().map(|f| (f.kind(), f)).collect(),
            bus,
        }
    }

    /// Subscribes to the pub/sub bus.
    ///
    /// Subscribe **before** inspecting current state to avoid missing
    /// transitions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.bus.subscribe()
    }

    /// Creates a container and begins loading it.
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the id is already registered, or an
    /// invalid configuration error if the config does not resolve to an
    /// interior factory.
    pub fn create(self: &Arc<Self>, id: impl Into<String>, config: &ContainerConfig) -> Result<ContainerId> {
        let id = ContainerId::from_string(id);

        let factory = self
            .factories
            .get(config.interior.as_str())
            .ok_or_else(|| {
                ContainerError::invalid_config(format!("unknown interior: {}", config.interior))
            })?
            .clone();

        let mut engines = self
            .engines
            .write()
            .map_err(|_| ContainerError::internal("registry lock poisoned"))?;

        if engines.contains_key(&id) {
            return Err(ContainerError::conflict(id.to_string()));
        }

        let (engine, events) = Engine::spawn(id.clone(), config, factory.as_ref())?;
        let destroying = Arc::new(AtomicBool::new(false));
        engines.insert(
            id.clone(),
            EngineEntry {
                engine: engine.clone(),
                destroying: Arc::clone(&destroying),
            },
        );
        drop(engines);

        self.spawn_forwarder(id.clone(), events, destroying);

        tracing::info!(id = %id, interior = factory.kind(), "container created");
        engine.set_state(StableState::Stopped, ActionOpts::default());
        Ok(id)
    }

    /// Requests destruction of a container.
    ///
    /// The engine is driven toward `offline`; the entry is removed once
    /// the engine settles there.
    ///
    /// # Errors
    ///
    /// Returns a not found error for an unknown id.
    pub fn destroy(&self, id: &ContainerId) -> Result<()> {
        let (engine, destroying) = self.entry(id)?;
        destroying.store(true, Ordering::SeqCst);

        // An engine already settled at offline will emit nothing more;
        // evict it directly.
        if engine.snapshot()?.state == ContainerState::Offline {
            self.evict(id);
            return Ok(());
        }

        engine.set_state(StableState::Offline, ActionOpts::default());
        Ok(())
    }

    /// Starts a container.
    ///
    /// # Errors
    ///
    /// Returns a not found error for an unknown id.
    pub fn start(&self, id: &ContainerId) -> Result<()> {
        let (engine, destroying) = self.entry(id)?;
        destroying.store(false, Ordering::SeqCst);
        engine.set_state(StableState::Running, ActionOpts::default());
        Ok(())
    }

    /// Stops a container. The force flag is forwarded to the interior's
    /// stop action.
    ///
    /// # Errors
    ///
    /// Returns a not found error for an unknown id.
    pub fn stop(&self, id: &ContainerId, force: bool) -> Result<()> {
        let (engine, destroying) = self.entry(id)?;
        destroying.store(false, Ordering::SeqCst);
        engine.set_state(StableState::Stopped, ActionOpts { force });
        Ok(())
    }

    /// Requests a status refresh from a container's interior.
    ///
    /// # Errors
    ///
    /// Returns a not found error for an unknown id.
    pub fn status(&self, id: &ContainerId) -> Result<()> {
        let (engine, _) = self.entry(id)?;
        engine.status();
        Ok(())
    }

    /// Returns an atomic snapshot of a container.
    ///
    /// # Errors
    ///
    /// Returns a not found error for an unknown id.
    pub fn query(&self, id: &ContainerId) -> Result<Snapshot> {
        let (engine, _) = self.entry(id)?;
        engine.snapshot()
    }

    /// Returns the current set of container ids.
    ///
    /// Not a consistent snapshot across entries.
    #[must_use]
    pub fn list(&self) -> Vec<ContainerId> {
        self.engines
            .read()
            .map(|engines| engines.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn entry(&self, id: &ContainerId) -> Result<(Engine, Arc<AtomicBool>)> {
        let engines = self
            .engines
            .read()
            .map_err(|_| ContainerError::internal("registry lock poisoned"))?;
        let entry = engines
            .get(id)
            .ok_or_else(|| ContainerError::not_found(id.to_string()))?;
        Ok((entry.engine.clone(), Arc::clone(&entry.destroying)))
    }

    fn evict(&self, id: &ContainerId) {
        let removed = self
            .engines
            .write()
            .ok()
            .and_then(|mut engines| engines.remove(id));
        if let Some(entry) = removed {
            entry.engine.shutdown();
            tracing::info!(id = %id, "container destroyed");
        }
    }

    /// Drains an engine's event stream onto the bus and handles
    /// self-eviction. The engine itself knows nothing about the registry.
    fn spawn_forwarder(
        self: &Arc<Self>,
        id: ContainerId,
        mut events: mpsc::UnboundedReceiver<EngineEvent>,
        destroying: Arc<AtomicBool>,
    ) {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    EngineEvent::State { state, last } => {
                        let _ = registry.bus.send(BusEvent::State {
                            id: id.to_string(),
                            state,
                            last_state: last,
                        });
                        if state == ContainerState::Offline
                            && last != ContainerState::Offline
                            && destroying.load(Ordering::SeqCst)
                        {
                            registry.evict(&id);
                        }
                    }
                    EngineEvent::Status(status) => {
                        let _ = registry.bus.send(BusEvent::Status {
                            id: id.to_string(),
                            status,
                        });
                    }
                    EngineEvent::Error(err) => {
                        tracing::warn!(id = %id, error = %err, "container error");
                        let _ = registry.bus.send(BusEvent::error(&id, &err));
                    }
                    EngineEvent::Ready(state) => {
                        tracing::debug!(id = %id, state = state.as_str(), "container settled");
                    }
                }
            }
        });
    }
}
