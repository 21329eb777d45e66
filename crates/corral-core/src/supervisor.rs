//! Process-supervisor interior.
//!
//! The built-in `process` interior realizes a container as a supervised
//! child process. It implements `start`, `stop`, and `status`; `load` and
//! `unload` are deliberately absent (there is nothing to provision for a
//! plain process), so the engine auto-advances through those legs.

use async_trait::async_trait;
use corral_container::{
    Action, ActionOpts, ContainerConfig, ContainerId, DynInterior, Interior, InteriorError,
    InteriorFactory, Monitor, StableState,
};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::process::Command;

/// Factory for the `process` interior.
pub struct ProcessFactory;

impl InteriorFactory for ProcessFactory {
    fn kind(&self) -> &'static str {
        "process"
    }

    fn create(
        &self,
        id: &ContainerId,
        config: &ContainerConfig,
        monitor: Monitor,
    ) -> corral_container::Result<DynInterior> {
        if config.command.is_empty() {
            return Err(corral_container::ContainerError::invalid_config(
                "process interior requires a non-empty command",
            ));
        }
        Ok(Arc::new(ProcessInterior {
            id: id.clone(),
            command: config.command.clone(),
            env: config.env.clone(),
            working_dir: config.working_dir.clone(),
            monitor,
            inner: Arc::new(Mutex::new(Inner::default())),
        }))
    }
}

#[derive(Default)]
struct Inner {
    /// PID of the running child, if any.
    pid: Option<u32>,
    /// Exit code of the last run.
    exit_code: Option<i32>,
}

/// Interior that supervises one child process.
pub struct ProcessInterior {
    id: ContainerId,
    command: Vec<String>,
    env: HashMap<String, String>,
    working_dir: Option<PathBuf>,
    monitor: Monitor,
    inner: Arc<Mutex<Inner>>,
}

impl ProcessInterior {
    async fn start(&self) -> Result<(), InteriorError> {
        {
            let inner = self.lock()?;
            if inner.pid.is_some() {
                // Already supervising a child.
                self.monitor.state(StableState::Running);
                return Ok(());
            }
        }

        let mut command = Command::new(&self.command[0]);
        command
            .args(&self.command[1..])
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(ref dir) = self.working_dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                // The child never existed; reporting stopped lets the
                // engine reconcile the failed start.
                self.monitor.state(StableState::Stopped);
                return Err(InteriorError::failure(format!(
                    "failed to spawn {}: {e}",
                    self.command[0]
                )));
            }
        };

        let pid = child.id().unwrap_or_default();
        {
            let mut inner = self.lock()?;
            inner.pid = Some(pid);
            inner.exit_code = None;
        }
        tracing::info!(id = %self.id, pid, "process started");
        self.monitor.state(StableState::Running);

        // Waiter: reports the exit out-of-band whenever it happens.
        let monitor = self.monitor.clone();
        let inner = Arc::clone(&self.inner);
        let id = self.id.clone();
        tokio::spawn(async move {
            let status = child.wait().await;
            let exit_code = status.ok().and_then(|s| s.code());
            if let Ok(mut inner) = inner.lock() {
                inner.pid = None;
                inner.exit_code = exit_code;
            }
            tracing::info!(id = %id, exit_code = ?exit_code, "process exited");
            monitor.status(json!({
                "pid": pid,
                "running": false,
                "exitCode": exit_code,
            }));
            monitor.state(StableState::Stopped);
        });

        Ok(())
    }

    fn stop(&self, opts: ActionOpts) -> Result<(), InteriorError> {
        let pid = self.lock()?.pid;
        let Some(pid) = pid else {
            // Nothing running; report the settled state.
            self.monitor.state(StableState::Stopped);
            return Ok(());
        };

        let signal = if opts.force {
            Signal::SIGKILL
        } else {
            Signal::SIGTERM
        };
        tracing::debug!(id = %self.id, pid, signal = %signal, "signaling process");
        kill(Pid::from_raw(pid as i32), signal)
            .map_err(|e| InteriorError::failure(format!("failed to signal pid {pid}: {e}")))?;

        // The waiter reports `stopped` once the child actually exits.
        Ok(())
    }

    fn report_status(&self) -> Result<(), InteriorError> {
        let inner = self.lock()?;
        self.monitor.status(json!({
            "pid": inner.pid,
            "running": inner.pid.is_some(),
            "exitCode": inner.exit_code,
        }));
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, InteriorError> {
        self.inner
            .lock()
            .map_err(|_| InteriorError::failure("supervisor state lock poisoned"))
    }
}

#[async_trait]
impl Interior for ProcessInterior {
    fn name(&self) -> &'static str {
        "process"
    }

    fn supported(&self) -> &'static [Action] {
        &[Action::Start, Action::Stop, Action::Status]
    }

    async fn invoke(&self, action: Action, opts: ActionOpts) -> Result<(), InteriorError> {
        match action {
            Action::Start => self.start().await,
            Action::Stop => self.stop(opts),
            Action::Status => self.report_status(),
            other => Err(InteriorError::Unsupported(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_container::{ContainerState, Engine, EngineEvent};
    use tokio::sync::mpsc;
    use tokio::time::{timeout, Duration};

    fn sh(script: &str) -> ContainerConfig {
        ContainerConfig {
            command: vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()],
            ..Default::default()
        }
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> EngineEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for engine event")
            .expect("engine event channel closed")
    }

    async fn wait_for_state(rx: &mut mpsc::UnboundedReceiver<EngineEvent>, state: ContainerState) {
        loop {
            if let EngineEvent::State { state: s, .. } = next_event(rx).await {
                if s == state {
                    return;
                }
            }
        }
    }

    #[test]
    fn factory_rejects_empty_command() {
        // The factory rejects before any task spawns, so no runtime is
        // needed here.
        let result = Engine::spawn(
            ContainerId::from_string("empty"),
            &ContainerConfig::default(),
            &ProcessFactory,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn supervised_process_lifecycle() {
        let (engine, mut rx) = Engine::spawn(
            ContainerId::from_string("sleeper"),
            &sh("sleep 30"),
            &ProcessFactory,
        )
        .unwrap();

        // load is unsupported: the engine auto-advances to stopped.
        engine.set_state(StableState::Stopped, ActionOpts::default());
        wait_for_state(&mut rx, ContainerState::Stopped).await;

        engine.set_state(StableState::Running, ActionOpts::default());
        wait_for_state(&mut rx, ContainerState::Running).await;
        let snapshot = engine.snapshot().unwrap();
        assert_eq!(snapshot.interior_state, StableState::Running);

        // SIGTERM terminates the sleep.
        engine.set_state(StableState::Stopped, ActionOpts::default());
        wait_for_state(&mut rx, ContainerState::Stopped).await;
    }

    #[tokio::test]
    async fn process_exit_is_reported_out_of_band() {
        let (engine, mut rx) = Engine::spawn(
            ContainerId::from_string("oneshot"),
            &sh("exit 0"),
            &ProcessFactory,
        )
        .unwrap();

        engine.set_state(StableState::Running, ActionOpts::default());
        wait_for_state(&mut rx, ContainerState::Running).await;

        // The shell exits on its own; the waiter reports a status payload
        // followed by the stopped state.
        let mut saw_exit_status = false;
        loop {
            match next_event(&mut rx).await {
                EngineEvent::Status(payload) => {
                    assert_eq!(payload["exitCode"], 0);
                    saw_exit_status = true;
                }
                EngineEvent::State { state, .. } if state == ContainerState::Stopped => break,
                _ => {}
            }
        }
        assert!(saw_exit_status);
        assert_eq!(
            engine.snapshot().unwrap().interior_state,
            StableState::Stopped
        );
    }

    #[tokio::test]
    async fn spawn_failure_settles_back_at_stopped() {
        let config = ContainerConfig {
            command: vec!["/nonexistent/corral-test-binary".to_string()],
            ..Default::default()
        };
        let (engine, mut rx) =
            Engine::spawn(ContainerId::from_string("broken"), &config, &ProcessFactory).unwrap();

        engine.set_state(StableState::Running, ActionOpts::default());

        // The failed start surfaces as error events and the engine
        // settles at stopped.
        let mut saw_error = false;
        let mut settled = false;
        while !(saw_error && settled) {
            match next_event(&mut rx).await {
                EngineEvent::Error(_) => saw_error = true,
                EngineEvent::State { state, .. } => settled = state == ContainerState::Stopped,
                _ => {}
            }
        }
        assert_eq!(engine.snapshot().unwrap().state, ContainerState::Stopped);
    }
}
