//! Security event definitions

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Closed set of security event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventKind {
    InitSuccess,
    InitFailed,
    ProtectionEnabled,
    ProtectionDisabled,
    EmulatorDetected,
    RootDetected,
    DevOptionsDetected,
    SecurityViolation,
    CriticalViolation,
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitSuccess => "init_success",
            Self::InitFailed => "init_failed",
            Self::ProtectionEnabled => "protection_enabled",
            Self::ProtectionDisabled => "protection_disabled",
            Self::EmulatorDetected => "emulator_detected",
            Self::RootDetected => "root_detected",
            Self::DevOptionsDetected => "dev_options_detected",
            Self::SecurityViolation => "security_violation",
            Self::CriticalViolation => "critical_violation",
        }
    }
}

impl fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the security audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub kind: SecurityEventKind,
    #[serde(default)]
    pub payload: Map<String, Value>,
    pub emitted_at: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(kind: SecurityEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            payload: Map::new(),
            emitted_at: Utc::now(),
        }
    }

    /// Add a payload field
    ///
    /// Values that cannot be represented as JSON are recorded as `null`.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.payload.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Payload string field, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}
