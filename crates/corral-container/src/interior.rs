//! The interior contract.
//!
//! An interior is the pluggable backend that actually realizes a container
//! (a process supervisor, a VM, etc.). The engine drives it through
//! [`Interior::invoke`] and observes it through the [`Monitor`] handle the
//! factory receives at construction time. All invocations are non-blocking
//! dispatches; outcomes arrive later through the monitor.

use crate::config::ContainerConfig;
use crate::engine::{InteriorEvent, Msg};
use crate::error::Result;
use crate::state::{ContainerId, StableState};
use crate::transition::Action;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Shared interior trait object.
pub type DynInterior = Arc<dyn Interior>;

/// Errors originating from an interior backend.
#[derive(Debug, Clone, Error)]
pub enum InteriorError {
    /// The interior does not implement the requested action.
    #[error("action not supported: {0}")]
    Unsupported(Action),

    /// The backend failed to carry out an operation.
    #[error("{0}")]
    Failure(String),
}

impl InteriorError {
    /// Creates a backend failure error.
    #[must_use]
    pub fn failure(msg: impl Into<String>) -> Self {
        Self::Failure(msg.into())
    }
}

/// Options accompanying an action invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionOpts {
    /// Forceful variant of the action, currently meaningful for `stop`.
    /// The interior decides what escalation means; the engine only
    /// forwards the flag.
    pub force: bool,
}

/// Container backend abstraction.
///
/// Implementations must never block in `invoke`: the call records intent
/// and returns; the resulting state change is reported through the
/// monitor whenever the backend gets there.
#[async_trait]
pub trait Interior: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &'static str;

    /// The actions this interior implements. `Stop` is mandatory.
    ///
    /// The engine consults this before dispatching; an unsupported action
    /// with a table fallback makes the engine advance directly.
    fn supported(&self) -> &'static [Action];

    /// Dispatches an action against the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatch itself fails; such errors surface
    /// as asynchronous `error` events and leave the engine state untouched.
    async fn invoke(&self, action: Action, opts: ActionOpts) -> std::result::Result<(), InteriorError>;
}

/// The callback handle through which an interior reports back.
///
/// Cloneable and cheap; every report is enqueued on the owning engine's
/// mailbox, so reports from any thread or task are serialized with user
/// commands.
#[derive(Clone)]
pub struct Monitor {
    id: ContainerId,
    tx: mpsc::UnboundedSender<Msg>,
}

impl Monitor {
    pub(crate) fn new(id: ContainerId, tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self { id, tx }
    }

    /// Returns the id of the container this monitor reports for.
    #[must_use]
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Reports the interior's stable state. Authoritative.
    pub fn state(&self, state: StableState) {
        let _ = self.tx.send(Msg::Interior(InteriorEvent::State(state)));
    }

    /// Reports a backend-specific status payload.
    pub fn status(&self, payload: Value) {
        let _ = self.tx.send(Msg::Interior(InteriorEvent::Status(payload)));
    }

    /// Reports a backend error. Does not affect engine state.
    pub fn error(&self, error: InteriorError) {
        let _ = self.tx.send(Msg::Interior(InteriorEvent::Error(error)));
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor").field("id", &self.id).finish()
    }
}

/// Factory that constructs an interior for a container.
pub trait InteriorFactory: Send + Sync {
    /// The interior kind this factory builds, as named in container
    /// configuration.
    fn kind(&self) -> &'static str;

    /// Builds an interior for the given container.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfig` error when the configuration cannot be
    /// realized; the engine is never instantiated in that case.
    fn create(
        &self,
        id: &ContainerId,
        config: &ContainerConfig,
        monitor: Monitor,
    ) -> Result<DynInterior>;
}
