//! Zero-tolerance policy engine
//!
//! Decides enforcement for one check cycle and keeps the process-lifetime
//! violation counter. Holds no other state and performs no side effects.

use serde::{Deserialize, Serialize};

use super::classifier::classify;
use super::types::{EnforcementAction, EnforcementKind, Severity, Violation};
use crate::signals::{DeviceSignals, SignalKind};

/// Result of running one cycle through the policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleOutcome {
    /// Every violation found, in rule order
    pub violations: Vec<Violation>,
    /// Enforcement decided for the cycle
    pub action: EnforcementAction,
    /// Signals that could not be determined this cycle
    pub unknown_signals: Vec<SignalKind>,
}

impl CycleOutcome {
    pub fn has_critical(&self) -> bool {
        self.violations.iter().any(Violation::is_critical)
    }

    pub fn has_high(&self) -> bool {
        self.violations.iter().any(|v| v.severity == Severity::High)
    }
}

/// Applies the zero-tolerance policy and tracks the audit counter
#[derive(Debug, Default)]
pub struct PolicyEngine {
    violation_count: u64,
}

impl PolicyEngine {
    /// Number of critical violations that triggers enforcement. Fixed.
    pub const MAX_VIOLATIONS: usize = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `signals`, decide enforcement, and add the findings to the counter
    pub fn run_cycle(&mut self, signals: &DeviceSignals) -> CycleOutcome {
        let violations = classify(signals);
        let action = Self::decide(&violations);
        self.violation_count += violations.len() as u64;

        CycleOutcome {
            violations,
            action,
            unknown_signals: signals.unknown_signals(),
        }
    }

    /// Pure decision over a violation list
    ///
    /// Any critical violation forces exit and carries only the critical
    /// violations; otherwise any high violation warns; otherwise nothing.
    pub fn decide(violations: &[Violation]) -> EnforcementAction {
        let critical: Vec<Violation> = violations
            .iter()
            .filter(|v| v.severity == Severity::Critical)
            .cloned()
            .collect();
        if critical.len() >= Self::MAX_VIOLATIONS {
            return EnforcementAction {
                kind: EnforcementKind::ForceExit,
                violations: critical,
            };
        }

        let high: Vec<Violation> = violations
            .iter()
            .filter(|v| v.severity == Severity::High)
            .cloned()
            .collect();
        if !high.is_empty() {
            return EnforcementAction {
                kind: EnforcementKind::WarnUser,
                violations: high,
            };
        }

        EnforcementAction::none()
    }

    /// Total violations seen since this engine was created
    pub fn violation_count(&self) -> u64 {
        self.violation_count
    }
}
