//! Violation classifier
//!
//! Pure mapping from a signal snapshot to an ordered violation list. The
//! rule table order is both evaluation order and output order.

use super::types::{RecommendedAction, Severity, Violation, ViolationKind};
use crate::signals::{DeviceSignals, SignalKind};

/// One row of the rule table
struct Rule {
    signal: SignalKind,
    kind: ViolationKind,
    severity: Severity,
    action: RecommendedAction,
    default_reason: &'static str,
}

const RULES: [Rule; 4] = [
    Rule {
        signal: SignalKind::Emulator,
        kind: ViolationKind::Emulator,
        severity: Severity::Critical,
        action: RecommendedAction::BlockAccess,
        default_reason: "device is an emulator",
    },
    Rule {
        signal: SignalKind::Root,
        kind: ViolationKind::Root,
        severity: Severity::Critical,
        action: RecommendedAction::BlockAccess,
        default_reason: "device is rooted",
    },
    Rule {
        signal: SignalKind::DeveloperOptions,
        kind: ViolationKind::DeveloperOptions,
        severity: Severity::High,
        action: RecommendedAction::WarnUser,
        default_reason: "developer options are enabled",
    },
    Rule {
        signal: SignalKind::DebugBuild,
        kind: ViolationKind::AppIntegrity,
        severity: Severity::High,
        action: RecommendedAction::WarnUser,
        default_reason: "application is running a debuggable build",
    },
];

/// Classify a snapshot into violations
///
/// Only facts known to be `true` produce a violation. Unknown facts are
/// skipped here and reported via [`DeviceSignals::unknown_signals`].
pub fn classify(signals: &DeviceSignals) -> Vec<Violation> {
    RULES
        .iter()
        .filter(|rule| signals.fact(rule.signal) == Some(true))
        .map(|rule| {
            // Debug-build evidence comes from device info, not a probe reason
            let reason = match rule.signal {
                SignalKind::DebugBuild => rule.default_reason,
                _ => signals
                    .evidence_for(rule.signal)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(rule.default_reason),
            };
            Violation::new(rule.kind, rule.severity, reason, rule.action)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(emulator: bool, rooted: bool, dev: bool, debug: bool) -> DeviceSignals {
        DeviceSignals {
            is_emulator: Some(emulator),
            is_rooted: Some(rooted),
            developer_options_enabled: Some(dev),
            is_debug_build: Some(debug),
            ..DeviceSignals::clean()
        }
    }

    #[test]
    fn clean_device_has_no_violations() {
        assert!(classify(&signals(false, false, false, false)).is_empty());
    }

    #[test]
    fn every_combination_follows_rule_table() {
        for bits in 0u8..16 {
            let (e, r, d, g) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            let violations = classify(&signals(e, r, d, g));

            let expected: Vec<ViolationKind> = [
                (e, ViolationKind::Emulator),
                (r, ViolationKind::Root),
                (d, ViolationKind::DeveloperOptions),
                (g, ViolationKind::AppIntegrity),
            ]
            .into_iter()
            .filter_map(|(on, kind)| on.then_some(kind))
            .collect();

            let kinds: Vec<ViolationKind> = violations.iter().map(|v| v.kind).collect();
            assert_eq!(kinds, expected, "bits {bits:04b}");
        }
    }

    #[test]
    fn emulator_and_root_are_critical_block_access() {
        let violations = classify(&signals(true, true, false, false));
        assert_eq!(violations.len(), 2);
        for v in &violations {
            assert_eq!(v.severity, Severity::Critical);
            assert_eq!(v.recommended_action, RecommendedAction::BlockAccess);
        }
    }

    #[test]
    fn developer_options_and_debug_build_are_high_warn_user() {
        let violations = classify(&signals(false, false, true, true));
        assert_eq!(violations[0].kind, ViolationKind::DeveloperOptions);
        assert_eq!(violations[1].kind, ViolationKind::AppIntegrity);
        for v in &violations {
            assert_eq!(v.severity, Severity::High);
            assert_eq!(v.recommended_action, RecommendedAction::WarnUser);
        }
    }

    #[test]
    fn unknown_facts_contribute_nothing() {
        assert!(classify(&DeviceSignals::unknown()).is_empty());
    }

    #[test]
    fn reason_uses_probe_evidence_when_present() {
        let mut snapshot = signals(false, true, false, false);
        snapshot
            .evidence
            .insert(SignalKind::Root, "Magisk manager installed".to_string());

        let violations = classify(&snapshot);
        assert_eq!(violations[0].reason, "Magisk manager installed");
    }

    #[test]
    fn reason_falls_back_to_rule_default() {
        let violations = classify(&signals(true, false, false, false));
        assert_eq!(violations[0].reason, "device is an emulator");
    }

    #[test]
    fn classify_is_deterministic() {
        let snapshot = signals(true, false, true, true);
        assert_eq!(classify(&snapshot), classify(&snapshot));
    }
}
