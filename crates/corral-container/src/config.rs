//! Container configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// Container configuration.
///
/// `interior` selects the backend factory; the remaining fields are
/// interpreted by the chosen backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Interior backend kind (e.g. "process").
    pub interior: String,
    /// Command to supervise (program followed by arguments).
    pub command: Vec<String>,
    /// Environment variables.
    pub env: HashMap<String, String>,
    /// Working directory.
    pub working_dir: Option<PathBuf>,
    /// Free-form backend options, passed through untouched.
    pub opts: Map<String, Value>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            interior: "process".to_string(),
            command: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            opts: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interior_kind() {
        let config = ContainerConfig::default();
        assert_eq!(config.interior, "process");
        assert!(config.command.is_empty());
    }

    #[test]
    fn test_partial_deserialization() {
        let config: ContainerConfig =
            serde_json::from_str(r#"{"command": ["sleep", "30"]}"#).unwrap();
        assert_eq!(config.interior, "process");
        assert_eq!(config.command, vec!["sleep", "30"]);
        assert!(config.working_dir.is_none());
    }
}
