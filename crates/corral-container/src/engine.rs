//! The container lifecycle engine.
//!
//! One engine exists per container. It reconciles the user-requested
//! target state with the state the interior actually reports, driving the
//! transient transitions of the transition table, firing interior actions
//! at the right moments, and surfacing divergence as transition failures.
//!
//! ## Execution model
//!
//! Each engine runs as a dedicated tokio task with an inbound mailbox.
//! User calls, monitor reports, deferred auto-advances, and action
//! completions all arrive as messages, so every mutation of `state`,
//! `expectation`, and `interior_state` happens on one logical execution
//! context. Interior actions are dispatched from spawned tasks, never
//! inline from a message handler, and their outcomes re-enter through the
//! mailbox.

use crate::error::{ContainerError, Result};
use crate::interior::{ActionOpts, DynInterior, InteriorError, InteriorFactory, Monitor};
use crate::state::{ContainerId, ContainerState, StableState};
use crate::transition::{plan, Action, Plan};
use crate::config::ContainerConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Events emitted by an engine, consumed by the registry.
#[derive(Debug)]
pub enum EngineEvent {
    /// The engine state changed (stable or transient).
    State {
        /// The new state.
        state: ContainerState,
        /// The previous state.
        last: ContainerState,
    },
    /// The interior reported a status payload.
    Status(Value),
    /// A transition failure or interior error.
    Error(ContainerError),
    /// The engine settled at its current expectation.
    Ready(StableState),
}

/// Events reported by the interior through its monitor.
#[derive(Debug)]
pub(crate) enum InteriorEvent {
    State(StableState),
    Status(Value),
    Error(InteriorError),
}

/// Mailbox messages for the engine task.
pub(crate) enum Msg {
    SetState { target: StableState, opts: ActionOpts },
    Status,
    Interior(InteriorEvent),
    Advance(StableState),
    ActionDone {
        action: Action,
        result: std::result::Result<(), InteriorError>,
    },
    Shutdown,
}

/// Atomic read of an engine's observable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Container id.
    pub id: String,
    /// Engine state.
    pub state: ContainerState,
    /// Last state reported by the interior.
    pub interior_state: StableState,
    /// Last status payload reported by the interior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

/// Snapshot state shared between the engine task and its handle.
struct Shared {
    state: ContainerState,
    interior_state: StableState,
    status: Option<Value>,
}

/// Handle to a running lifecycle engine.
///
/// Cheap to clone; all methods return after enqueueing work on the
/// engine's mailbox.
#[derive(Clone)]
pub struct Engine {
    id: ContainerId,
    cmd_tx: mpsc::UnboundedSender<Msg>,
    shared: Arc<RwLock<Shared>>,
}

impl Engine {
    /// Constructs the interior through `factory` and spawns the engine
    /// task. The engine starts at `offline` with no expectation.
    ///
    /// Returns the handle and the receiver for the engine's event stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the factory rejects the configuration; no
    /// engine is instantiated in that case.
    pub fn spawn(
        id: ContainerId,
        config: &ContainerConfig,
        factory: &dyn InteriorFactory,
    ) -> Result<(Self, mpsc::UnboundedReceiver<EngineEvent>)> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let monitor = Monitor::new(id.clone(), cmd_tx.clone());
        let interior = factory.create(&id, config, monitor)?;

        let shared = Arc::new(RwLock::new(Shared {
            state: ContainerState::Offline,
            interior_state: StableState::Offline,
            status: None,
        }));

        let task = EngineTask {
            id: id.clone(),
            state: ContainerState::Offline,
            expectation: None,
            accepts: None,
            pending_action: None,
            pending_opts: ActionOpts::default(),
            interior,
            cmd_tx: cmd_tx.clone(),
            events: event_tx,
            shared: Arc::clone(&shared),
        };
        tokio::spawn(task.run(cmd_rx));

        Ok((
            Self {
                id,
                cmd_tx,
                shared,
            },
            event_rx,
        ))
    }

    /// Returns the container id.
    #[must_use]
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Records a new expectation and schedules the transition toward it.
    ///
    /// Returns immediately; progress is reported through the event stream.
    /// In a transient state the expectation is stored and resolved at the
    /// next settle point.
    pub fn set_state(&self, target: StableState, opts: ActionOpts) {
        let _ = self.cmd_tx.send(Msg::SetState { target, opts });
    }

    /// Requests a status report from the interior, if it implements one.
    ///
    /// Idempotent with respect to engine state; results flow in
    /// asynchronously through the event stream.
    pub fn status(&self) {
        let _ = self.cmd_tx.send(Msg::Status);
    }

    /// Returns an atomic read of `{id, state, interior_state, status}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot lock is poisoned.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let shared = self
            .shared
            .read()
            .map_err(|_| ContainerError::internal("snapshot lock poisoned"))?;
        Ok(Snapshot {
            id: self.id.to_string(),
            state: shared.state,
            interior_state: shared.interior_state,
            status: shared.status.clone(),
        })
    }

    /// Stops the engine task. Used by the registry on eviction.
    pub(crate) fn shutdown(&self) {
        let _ = self.cmd_tx.send(Msg::Shutdown);
    }
}

/// The engine task state. Lives on the spawned task; all fields are
/// mutated from message handlers only.
struct EngineTask {
    id: ContainerId,
    state: ContainerState,
    /// The stable state the user wants the container to reach.
    expectation: Option<StableState>,
    /// Accepted path of the active plan; `None` when settled.
    accepts: Option<&'static [ContainerState]>,
    /// Transition action dispatched and not yet settled by a report.
    pending_action: Option<Action>,
    /// Options for the next scheduled action (carries the force flag).
    pending_opts: ActionOpts,
    interior: DynInterior,
    cmd_tx: mpsc::UnboundedSender<Msg>,
    events: mpsc::UnboundedSender<EngineEvent>,
    shared: Arc<RwLock<Shared>>,
}

impl EngineTask {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Msg>) {
        while let Some(msg) = rx.recv().await {
            match msg {
                Msg::SetState { target, opts } => self.handle_set_state(target, opts),
                Msg::Status => self.handle_status_request(),
                Msg::Interior(InteriorEvent::State(state)) => self.handle_report(state),
                Msg::Interior(InteriorEvent::Status(payload)) => self.handle_status_report(payload),
                Msg::Interior(InteriorEvent::Error(err)) => {
                    // Backend-originated error: forwarded untouched. State
                    // is reconciled by the next reported interior state.
                    self.emit(EngineEvent::Error(ContainerError::Interior(err)));
                }
                Msg::Advance(state) => self.handle_report(state),
                Msg::ActionDone { action, result } => self.handle_action_done(action, result),
                Msg::Shutdown => break,
            }
        }
        tracing::debug!(id = %self.id, "engine task stopped");
    }

    fn handle_set_state(&mut self, target: StableState, opts: ActionOpts) {
        tracing::debug!(id = %self.id, target = target.as_str(), "state change requested");
        self.pending_opts = opts;

        if let Some(current) = self.state.as_stable() {
            if current == target {
                // Already settled at the target. Nothing is emitted, so
                // repeating a request leaves the event trace unchanged.
                self.expectation = None;
                self.accepts = None;
                return;
            }
            self.expectation = Some(target);
            self.begin_plan(target);
            return;
        }

        // Transient state: record the expectation and resolve it at the
        // next settle point. While an action is in flight only the
        // accepted path is widened; a parked engine (unsupported action
        // without fallback) may act immediately.
        self.expectation = Some(target);
        if let Some(p) = plan(self.state, target) {
            if self.pending_action.is_some() {
                self.accepts = Some(p.accepts);
            } else {
                self.execute(p);
            }
        }
        if opts.force
            && self.state == ContainerState::Stopping
            && self.pending_action == Some(Action::Stop)
        {
            // Escalate an in-flight stop: forward the force flag as a
            // fresh dispatch. What escalation means is up to the interior.
            self.dispatch(Action::Stop, ActionOpts { force: true });
        }
    }

    /// Plans the next leg from the current (stable) state toward `target`
    /// and starts executing it.
    fn begin_plan(&mut self, target: StableState) {
        match plan(self.state, target) {
            Some(p) => self.execute(p),
            None => {
                tracing::warn!(
                    id = %self.id,
                    state = self.state.as_str(),
                    target = target.as_str(),
                    "no transition path"
                );
            }
        }
    }

    fn execute(&mut self, p: Plan) {
        self.accepts = Some(p.accepts);
        if let Some(intermediate) = p.intermediate {
            self.transition_to(intermediate);
        }
        let Some(action) = p.action else {
            // Wait-only row: an earlier action is draining toward a
            // settle point.
            return;
        };
        if self.interior.supported().contains(&action) {
            let opts = std::mem::take(&mut self.pending_opts);
            self.dispatch(action, opts);
        } else if let Some(next) = p.auto_advance {
            // One-step deferral through the mailbox, never inline.
            let _ = self.cmd_tx.send(Msg::Advance(next));
        } else {
            tracing::debug!(
                id = %self.id,
                action = action.as_str(),
                "action not implemented and no fallback; waiting for the interior"
            );
        }
    }

    /// Handles a stable state report, either from the interior monitor or
    /// synthesized by an auto-advance. Both settle the active leg.
    fn handle_report(&mut self, reported: StableState) {
        self.pending_action = None;
        self.record_interior_state(reported);

        let next = ContainerState::from(reported);
        if next == self.state {
            // Spurious report: no event.
            return;
        }

        let Some(target) = self.expectation else {
            // Out-of-band change with nothing pending, e.g. the workload
            // exited on its own.
            self.transition_to(next);
            return;
        };

        let accepts = self.accepts.unwrap_or(&[]);
        if !accepts.contains(&next) {
            // The interior diverged from the accepted path. Latch the
            // reported state; the engine is usable again immediately.
            self.transition_to(next);
            self.emit(EngineEvent::Error(ContainerError::TransitionFailed {
                expectation: target,
                actual: reported,
                accepts: accepts.to_vec(),
            }));
            self.expectation = None;
            self.accepts = None;
            return;
        }

        self.transition_to(next);
        if reported == target {
            self.expectation = None;
            self.accepts = None;
            self.emit(EngineEvent::Ready(target));
            return;
        }
        self.begin_plan(target);
    }

    fn handle_status_request(&mut self) {
        if self.interior.supported().contains(&Action::Status) {
            self.dispatch(Action::Status, ActionOpts::default());
        }
    }

    fn handle_status_report(&mut self, payload: Value) {
        if let Ok(mut shared) = self.shared.write() {
            shared.status = Some(payload.clone());
        }
        self.emit(EngineEvent::Status(payload));
    }

    fn handle_action_done(
        &mut self,
        action: Action,
        result: std::result::Result<(), InteriorError>,
    ) {
        if let Err(err) = result {
            if self.pending_action == Some(action) {
                // The dispatch never reached the backend; allow a later
                // request to schedule a fresh action.
                self.pending_action = None;
            }
            tracing::warn!(
                id = %self.id,
                action = action.as_str(),
                error = %err,
                "interior action failed"
            );
            self.emit(EngineEvent::Error(ContainerError::Interior(err)));
        }
    }

    fn dispatch(&mut self, action: Action, opts: ActionOpts) {
        if action != Action::Status {
            self.pending_action = Some(action);
        }
        tracing::debug!(
            id = %self.id,
            action = action.as_str(),
            force = opts.force,
            "dispatching interior action"
        );
        let interior = Arc::clone(&self.interior);
        let tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            let result = interior.invoke(action, opts).await;
            let _ = tx.send(Msg::ActionDone { action, result });
        });
    }

    fn transition_to(&mut self, next: ContainerState) {
        if next == self.state {
            return;
        }
        let last = self.state;
        self.state = next;
        if let Ok(mut shared) = self.shared.write() {
            shared.state = next;
        }
        tracing::debug!(
            id = %self.id,
            from = last.as_str(),
            to = next.as_str(),
            "state changed"
        );
        self.emit(EngineEvent::State { state: next, last });
    }

    fn record_interior_state(&mut self, state: StableState) {
        if let Ok(mut shared) = self.shared.write() {
            shared.interior_state = state;
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}
