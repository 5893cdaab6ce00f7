//! Engine configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::SecurityLevel;

/// Configuration for a SecurityStateManager
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Assurance level reported in the summary
    #[serde(default)]
    pub security_level: SecurityLevel,

    /// Treat high-severity violations as a reason to degrade
    #[serde(default)]
    pub degrade_on_high_severity: bool,

    /// Broadcast capacity of the in-memory event sink
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Seconds between periodic rechecks
    #[serde(default = "default_recheck_interval_secs")]
    pub recheck_interval_secs: u64,
}

fn default_event_capacity() -> usize {
    256
}

fn default_recheck_interval_secs() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            security_level: SecurityLevel::default(),
            degrade_on_high_severity: false,
            event_capacity: default_event_capacity(),
            recheck_interval_secs: default_recheck_interval_secs(),
        }
    }
}

impl EngineConfig {
    /// Recheck interval as a Duration, never shorter than one second
    pub fn recheck_interval(&self) -> Duration {
        Duration::from_secs(self.recheck_interval_secs.max(1))
    }
}
