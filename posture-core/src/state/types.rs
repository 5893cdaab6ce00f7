//! Security state and summary types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::{Severity, Violation, ViolationKind};
use crate::signals::{DeviceSignals, SignalKind};

/// Configured assurance level, reported in the summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    /// Every check must pass
    #[default]
    Enterprise,
    /// Critical checks must pass
    High,
    /// Some risk tolerated
    Medium,
    /// Basic protection only
    Low,
}

impl SecurityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enterprise => "enterprise",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached view of the engine's posture, replaced atomically per cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySummary {
    pub screenshot_protection_enabled: bool,
    pub native_provider_available: bool,
    pub security_level: SecurityLevel,
    /// Violations seen since the last reinitialize (never decreases otherwise)
    pub violation_count: u64,
    pub device_signals: Option<DeviceSignals>,
    pub last_check_at: Option<DateTime<Utc>>,
    pub initialized_at: Option<DateTime<Utc>>,
}

impl SecuritySummary {
    /// Summary of an engine that has not checked anything yet
    pub fn empty(security_level: SecurityLevel) -> Self {
        Self {
            screenshot_protection_enabled: false,
            native_provider_available: false,
            security_level,
            violation_count: 0,
            device_signals: None,
            last_check_at: None,
            initialized_at: None,
        }
    }

    /// Degraded-confidence markers from the last cycle
    pub fn unknown_signals(&self) -> Vec<SignalKind> {
        self.device_signals
            .as_ref()
            .map(DeviceSignals::unknown_signals)
            .unwrap_or_default()
    }
}

impl Default for SecuritySummary {
    fn default() -> Self {
        Self::empty(SecurityLevel::default())
    }
}

/// Why a usable engine is not `Ready`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DegradedReason {
    /// A critical device-trust violation is outstanding
    CriticalViolation { kind: ViolationKind, reason: String },
    /// A high-severity violation, when configured to degrade
    HighSeverity { kind: ViolationKind, reason: String },
    /// Screen-capture protection could not be enabled
    ProtectionUnavailable { error: String },
}

impl DegradedReason {
    pub fn from_violation(violation: &Violation) -> Self {
        match violation.severity {
            Severity::Critical => Self::CriticalViolation {
                kind: violation.kind,
                reason: violation.reason.clone(),
            },
            _ => Self::HighSeverity {
                kind: violation.kind,
                reason: violation.reason.clone(),
            },
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Self::CriticalViolation { .. })
    }
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CriticalViolation { kind, reason } => write!(f, "critical {kind}: {reason}"),
            Self::HighSeverity { kind, reason } => write!(f, "high {kind}: {reason}"),
            Self::ProtectionUnavailable { error } => {
                write!(f, "capture protection unavailable: {error}")
            }
        }
    }
}

/// Lifecycle state of the security engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SecurityState {
    Uninitialized,
    Initializing,
    Ready {
        summary: SecuritySummary,
    },
    Degraded {
        summary: SecuritySummary,
        reasons: Vec<DegradedReason>,
    },
    /// Terminal until `reinitialize()`
    Fatal {
        reason: String,
    },
}

impl Default for SecurityState {
    fn default() -> Self {
        Self::Uninitialized
    }
}

impl SecurityState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready { .. } => "ready",
            Self::Degraded { .. } => "degraded",
            Self::Fatal { .. } => "fatal",
        }
    }

    /// Summary for `Ready`/`Degraded`
    pub fn summary(&self) -> Option<&SecuritySummary> {
        match self {
            Self::Ready { summary } | Self::Degraded { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// `Ready` or `Degraded`: rechecks are allowed
    pub fn is_operational(&self) -> bool {
        self.summary().is_some()
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    pub fn degraded_reasons(&self) -> &[DegradedReason] {
        match self {
            Self::Degraded { reasons, .. } => reasons,
            _ => &[],
        }
    }
}

impl fmt::Display for SecurityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RecommendedAction;

    #[test]
    fn security_state_default_is_uninitialized() {
        let state = SecurityState::default();
        assert!(matches!(state, SecurityState::Uninitialized));
        assert!(!state.is_operational());
    }

    #[test]
    fn only_ready_and_degraded_carry_summary() {
        let summary = SecuritySummary::default();
        assert!(
            SecurityState::Ready {
                summary: summary.clone()
            }
            .is_operational()
        );
        assert!(
            SecurityState::Degraded {
                summary,
                reasons: vec![]
            }
            .is_operational()
        );
        assert!(
            !SecurityState::Fatal {
                reason: "provider unavailable".to_string()
            }
            .is_operational()
        );
        assert!(SecurityState::Initializing.summary().is_none());
    }

    #[test]
    fn security_state_serialization_roundtrip() {
        let state = SecurityState::Degraded {
            summary: SecuritySummary::default(),
            reasons: vec![DegradedReason::ProtectionUnavailable {
                error: "window gone".to_string(),
            }],
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"status\":\"degraded\""));
        assert!(json.contains("protection_unavailable"));
        let parsed: SecurityState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn degraded_reason_from_violation_tracks_severity() {
        let root = Violation::new(
            ViolationKind::Root,
            Severity::Critical,
            "su found",
            RecommendedAction::BlockAccess,
        );
        let dev = Violation::new(
            ViolationKind::DeveloperOptions,
            Severity::High,
            "dev on",
            RecommendedAction::WarnUser,
        );
        assert!(DegradedReason::from_violation(&root).is_critical());
        assert!(!DegradedReason::from_violation(&dev).is_critical());
    }

    #[test]
    fn empty_summary_reports_provider_unavailable() {
        let summary = SecuritySummary::empty(SecurityLevel::High);
        assert!(!summary.native_provider_available);
        assert_eq!(summary.security_level, SecurityLevel::High);
        assert!(summary.unknown_signals().is_empty());
    }

    #[test]
    fn security_level_parses_lowercase() {
        let level: SecurityLevel = serde_json::from_str("\"enterprise\"").unwrap();
        assert_eq!(level, SecurityLevel::Enterprise);
    }
}
