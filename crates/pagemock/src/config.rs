//! Session configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for interception sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Glob pattern handed to the host's interception mechanism.
    #[serde(default = "default_route_pattern")]
    pub route_pattern: String,

    /// Bound on "wait for a matching exchange" operations, in milliseconds.
    /// Hitting the bound is not an error; the wait returns absent.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
}

fn default_route_pattern() -> String {
    "**/*".to_string()
}

fn default_wait_timeout_ms() -> u64 {
    10_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            route_pattern: default_route_pattern(),
            wait_timeout_ms: default_wait_timeout_ms(),
        }
    }
}

impl SessionConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.route_pattern.is_empty() {
            anyhow::bail!("routePattern must not be empty");
        }
        if self.wait_timeout_ms == 0 {
            anyhow::bail!("waitTimeoutMs must be greater than zero");
        }
        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}
