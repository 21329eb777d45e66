//! Container identifiers and lifecycle states.

use corral_error::CommonError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Container identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new random container ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string().replace('-', "")[..12].to_string())
    }

    /// Creates a container ID from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable container state.
///
/// The interior only ever reports these three states; they are
/// authoritative for both the engine and the interior. They are also the
/// only legal targets for a state change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StableState {
    /// Not loaded.
    Offline,
    /// Loaded but not running.
    Stopped,
    /// Running.
    Running,
}

impl StableState {
    /// Returns the state name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Stopped => "stopped",
            Self::Running => "running",
        }
    }
}

impl std::fmt::Display for StableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StableState {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offline" => Ok(Self::Offline),
            "stopped" => Ok(Self::Stopped),
            "running" => Ok(Self::Running),
            other => Err(CommonError::invalid_argument(format!(
                "not a stable state: {other}"
            ))),
        }
    }
}

/// Container lifecycle state.
///
/// The three stable states plus the transient states the engine passes
/// through while a transition is in progress. The interior never reports
/// a transient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// Not loaded.
    Offline,
    /// Offline to stopped in progress.
    Loading,
    /// Loaded but not running.
    Stopped,
    /// Stopped to running in progress.
    Starting,
    /// Running.
    Running,
    /// Running to stopped in progress.
    Stopping,
    /// Stopped to offline in progress.
    Unloading,
}

impl ContainerState {
    /// Returns the state name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Loading => "loading",
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Unloading => "unloading",
        }
    }

    /// Returns true if this is one of the three stable states.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        self.as_stable().is_some()
    }

    /// Projects this state onto a stable state, if it is one.
    #[must_use]
    pub const fn as_stable(&self) -> Option<StableState> {
        match self {
            Self::Offline => Some(StableState::Offline),
            Self::Stopped => Some(StableState::Stopped),
            Self::Running => Some(StableState::Running),
            _ => None,
        }
    }
}

impl From<StableState> for ContainerState {
    fn from(state: StableState) -> Self {
        match state {
            StableState::Offline => Self::Offline,
            StableState::Stopped => Self::Stopped,
            StableState::Running => Self::Running,
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_stable_state_parse() {
        assert_eq!(StableState::from_str("offline").unwrap(), StableState::Offline);
        assert_eq!(StableState::from_str("stopped").unwrap(), StableState::Stopped);
        assert_eq!(StableState::from_str("running").unwrap(), StableState::Running);
    }

    #[test]
    fn test_stable_state_parse_rejects_transients() {
        for s in ["loading", "starting", "stopping", "unloading", "paused", ""] {
            let err = StableState::from_str(s).unwrap_err();
            assert!(err.is_invalid_argument(), "{s} should not parse");
        }
    }

    #[test]
    fn test_state_projection() {
        assert_eq!(ContainerState::Running.as_stable(), Some(StableState::Running));
        assert_eq!(ContainerState::Stopping.as_stable(), None);
        assert!(ContainerState::Offline.is_stable());
        assert!(!ContainerState::Loading.is_stable());
    }

    #[test]
    fn test_state_serde_lowercase() {
        let json = serde_json::to_string(&ContainerState::Unloading).unwrap();
        assert_eq!(json, "\"unloading\"");
        let back: ContainerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ContainerState::Unloading);
    }

    #[test]
    fn test_container_id_display() {
        let id = ContainerId::from_string("web1");
        assert_eq!(id.to_string(), "web1");
        assert_eq!(id.as_str(), "web1");
    }

    #[test]
    fn test_container_id_random_length() {
        let id = ContainerId::new();
        assert_eq!(id.as_str().len(), 12);
    }
}
