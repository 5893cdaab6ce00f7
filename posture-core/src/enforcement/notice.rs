//! User-facing notices handed to the presentation layer

use serde::{Deserialize, Serialize};

use crate::policy::{Violation, ViolationKind};
use crate::state::{DegradedReason, SecurityState};

/// How intrusive a notice is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Covers the app; cannot be dismissed
    Blocking,
    /// Informational; the user may dismiss it
    Warning,
}

/// Actions a notice may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeAction {
    Exit,
    Retry,
    Acknowledge,
}

impl NoticeAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exit => "Exit app",
            Self::Retry => "Retry",
            Self::Acknowledge => "I understand",
        }
    }
}

/// A notice the presentation port renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub lines: Vec<String>,
    pub dismissible: bool,
    /// Offered actions; the first is the default
    pub actions: Vec<NoticeAction>,
}

fn violation_line(kind: ViolationKind, reason: &str) -> String {
    match kind {
        ViolationKind::Emulator => "Emulator environment detected".to_string(),
        ViolationKind::Root => "Device is rooted".to_string(),
        ViolationKind::DeveloperOptions => "Developer options are enabled".to_string(),
        ViolationKind::AppIntegrity => "Application is running a debuggable build".to_string(),
        _ => reason.to_string(),
    }
}

impl Notice {
    /// Blocking notice for a forced exit; exit is the only action
    pub fn force_exit(violations: &[Violation], os_version_code: Option<u32>) -> Self {
        let mut lines: Vec<String> = violations
            .iter()
            .map(|v| violation_line(v.kind, &v.reason))
            .collect();
        lines.push("This is an enterprise security requirement and cannot be bypassed.".to_string());
        lines.push(match os_version_code {
            Some(code) => format!("Platform: API {code}"),
            None => "Platform: unknown".to_string(),
        });

        Self {
            level: NoticeLevel::Blocking,
            title: "Security violation - access blocked".to_string(),
            lines,
            dismissible: false,
            actions: vec![NoticeAction::Exit],
        }
    }

    /// Dismissible warning for high-severity findings
    pub fn warning(violations: &[Violation], manufacturer: Option<&str>, model: Option<&str>) -> Self {
        let mut lines: Vec<String> = violations
            .iter()
            .map(|v| violation_line(v.kind, &v.reason))
            .collect();
        lines.push("Turn these options off to improve security.".to_string());
        if let (Some(manufacturer), Some(model)) = (manufacturer, model) {
            lines.push(format!("Device: {manufacturer} {model}"));
        }

        Self {
            level: NoticeLevel::Warning,
            title: "Security warning".to_string(),
            lines,
            dismissible: true,
            actions: vec![NoticeAction::Acknowledge],
        }
    }

    /// Notice the UI must show for a lifecycle state, if any
    ///
    /// `Fatal` and critical `Degraded` get a blocking exit+retry notice;
    /// other `Degraded` states get a dismissible warning.
    pub fn for_state(state: &SecurityState) -> Option<Self> {
        match state {
            SecurityState::Fatal { reason } => Some(Self {
                level: NoticeLevel::Blocking,
                title: "Security module unavailable".to_string(),
                lines: vec![
                    format!("The device security module could not start: {reason}"),
                    "Protected content cannot be shown on this device.".to_string(),
                ],
                dismissible: false,
                actions: vec![NoticeAction::Exit, NoticeAction::Retry],
            }),
            SecurityState::Degraded { reasons, .. } if reasons.iter().any(DegradedReason::is_critical) => {
                let lines = reasons
                    .iter()
                    .filter_map(|r| match r {
                        DegradedReason::CriticalViolation { kind, reason } => {
                            Some(violation_line(*kind, reason))
                        }
                        _ => None,
                    })
                    .collect();
                Some(Self {
                    level: NoticeLevel::Blocking,
                    title: "Security violation - access blocked".to_string(),
                    lines,
                    dismissible: false,
                    actions: vec![NoticeAction::Exit, NoticeAction::Retry],
                })
            }
            SecurityState::Degraded { reasons, .. } => {
                let lines = reasons
                    .iter()
                    .map(|r| match r {
                        DegradedReason::HighSeverity { kind, reason } => violation_line(*kind, reason),
                        DegradedReason::ProtectionUnavailable { .. } => {
                            "Screen capture protection is not active".to_string()
                        }
                        DegradedReason::CriticalViolation { kind, reason } => {
                            violation_line(*kind, reason)
                        }
                    })
                    .collect();
                Some(Self {
                    level: NoticeLevel::Warning,
                    title: "Security warning".to_string(),
                    lines,
                    dismissible: true,
                    actions: vec![NoticeAction::Acknowledge],
                })
            }
            _ => None,
        }
    }

    /// Default action (first offered)
    pub fn primary_action(&self) -> Option<NoticeAction> {
        self.actions.first().copied()
    }

    pub fn offers(&self, action: NoticeAction) -> bool {
        self.actions.contains(&action)
    }
}
