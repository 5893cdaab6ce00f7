//! Violation and enforcement types

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a violation is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Emulator,
    Root,
    DeveloperOptions,
    AppIntegrity,
    ScreenProtectionFailure,
    Tampering,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emulator => "emulator",
            Self::Root => "root",
            Self::DeveloperOptions => "developer_options",
            Self::AppIntegrity => "app_integrity",
            Self::ScreenProtectionFailure => "screen_protection_failure",
            Self::Tampering => "tampering",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violation severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the rule table recommends doing about a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    BlockAccess,
    WarnUser,
    LogOnly,
}

/// A classified, severity-tagged finding from one check cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub reason: String,
    pub recommended_action: RecommendedAction,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        severity: Severity,
        reason: impl Into<String>,
        recommended_action: RecommendedAction,
    ) -> Self {
        Self {
            kind,
            severity,
            reason: reason.into(),
            recommended_action,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// Enforcement decided for a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementKind {
    None,
    WarnUser,
    ForceExit,
}

impl EnforcementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::WarnUser => "warn_user",
            Self::ForceExit => "force_exit",
        }
    }
}

/// The enforcement decision plus the violations that drove it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementAction {
    pub kind: EnforcementKind,
    pub violations: Vec<Violation>,
}

impl EnforcementAction {
    pub fn none() -> Self {
        Self {
            kind: EnforcementKind::None,
            violations: Vec::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == EnforcementKind::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_most_severe_first() {
        assert!(Severity::Critical < Severity::High);
        assert!(Severity::High < Severity::Medium);
        assert!(Severity::Medium < Severity::Low);
    }

    #[test]
    fn violation_serializes_with_snake_case_tags() {
        let violation = Violation::new(
            ViolationKind::DeveloperOptions,
            Severity::High,
            "usb debugging on",
            RecommendedAction::WarnUser,
        );
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["kind"], "developer_options");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["recommended_action"], "warn_user");
    }

    #[test]
    fn critical_flag_follows_severity() {
        let critical = Violation::new(
            ViolationKind::Root,
            Severity::Critical,
            "su",
            RecommendedAction::BlockAccess,
        );
        assert!(critical.is_critical());
    }

    #[test]
    fn enforcement_none_has_no_violations() {
        let action = EnforcementAction::none();
        assert!(action.is_none());
        assert!(action.violations.is_empty());
        assert_eq!(action.kind.as_str(), "none");
    }
}
