//! EnforcementController executes policy decisions
//!
//! It is the only component with side effects on the presentation layer.
//! Critical decisions always end in termination: a forced-exit notice has no
//! path that lets the user continue.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::notice::{Notice, NoticeAction};
use super::traits::EnforcementPort;
use crate::events::{EventSink, SecurityEvent, SecurityEventKind};
use crate::policy::{EnforcementAction, EnforcementKind, ViolationKind};
use crate::signals::DeviceSignals;

/// Applies enforcement actions through an injected port
pub struct EnforcementController {
    port: Arc<dyn EnforcementPort>,
    sink: Arc<dyn EventSink>,
}

impl EnforcementController {
    pub fn new(port: Arc<dyn EnforcementPort>, sink: Arc<dyn EventSink>) -> Self {
        Self { port, sink }
    }

    /// Carry out `action`
    ///
    /// Events are published before this returns. The user's response to a
    /// notice is handled by the returned task; `None` means no notice was
    /// shown.
    pub async fn apply(
        &self,
        action: &EnforcementAction,
        device: Option<&DeviceSignals>,
    ) -> Option<JoinHandle<()>> {
        match action.kind {
            EnforcementKind::None => None,
            EnforcementKind::ForceExit => Some(self.force_exit(action, device).await),
            EnforcementKind::WarnUser => Some(self.warn_user(action, device).await),
        }
    }

    async fn force_exit(
        &self,
        action: &EnforcementAction,
        device: Option<&DeviceSignals>,
    ) -> JoinHandle<()> {
        let kinds: Vec<ViolationKind> = action.violations.iter().map(|v| v.kind).collect();
        warn!(violations = ?kinds, "Critical violation, forcing exit");

        self.sink
            .publish(
                SecurityEvent::new(SecurityEventKind::CriticalViolation)
                    .with("action", EnforcementKind::ForceExit.as_str())
                    .with("kinds", &kinds)
                    .with("violations", &action.violations),
            )
            .await;

        let notice = Notice::force_exit(
            &action.violations,
            device.and_then(|d| d.os_version_code),
        );
        let (tx, rx) = oneshot::channel();
        self.port.present(notice, tx);

        let port = Arc::clone(&self.port);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            match rx.await {
                Ok(NoticeAction::Exit) => {
                    sink.publish(
                        SecurityEvent::new(SecurityEventKind::SecurityViolation)
                            .with("action", "user_forced_exit")
                            .with("reason", "critical_violations"),
                    )
                    .await;
                }
                Ok(other) => {
                    warn!(action = ?other, "Forced-exit notice answered with a non-exit action");
                }
                Err(_) => {
                    warn!("Forced-exit notice closed without a response");
                }
            }
            info!("Terminating after critical violation");
            port.terminate();
        })
    }

    async fn warn_user(
        &self,
        action: &EnforcementAction,
        device: Option<&DeviceSignals>,
    ) -> JoinHandle<()> {
        let kinds: Vec<ViolationKind> = action.violations.iter().map(|v| v.kind).collect();
        info!(violations = ?kinds, "High-severity violation, warning user");

        self.sink
            .publish(
                SecurityEvent::new(SecurityEventKind::SecurityViolation)
                    .with("action", EnforcementKind::WarnUser.as_str())
                    .with("kinds", &kinds)
                    .with("violations", &action.violations),
            )
            .await;

        let notice = Notice::warning(
            &action.violations,
            device.and_then(|d| d.manufacturer.as_deref()),
            device.and_then(|d| d.model.as_deref()),
        );
        let (tx, rx) = oneshot::channel();
        self.port.present(notice, tx);

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            match rx.await {
                Ok(NoticeAction::Acknowledge) => {
                    sink.publish(
                        SecurityEvent::new(SecurityEventKind::SecurityViolation)
                            .with("action", "user_acknowledged")
                            .with("reason", "high_violations"),
                    )
                    .await;
                }
                Ok(other) => debug!(action = ?other, "Warning closed"),
                Err(_) => debug!("Warning closed without acknowledgement"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enforcement::mock::{RecordingPort, Reply};
    use crate::enforcement::notice::NoticeLevel;
    use crate::events::MemoryEventSink;
    use crate::policy::{PolicyEngine, RecommendedAction, Severity, Violation};

    fn setup(reply: Reply) -> (EnforcementController, Arc<RecordingPort>, Arc<MemoryEventSink>) {
        let port = Arc::new(RecordingPort::with_reply(reply));
        let sink = Arc::new(MemoryEventSink::new(64));
        let controller = EnforcementController::new(port.clone(), sink.clone());
        (controller, port, sink)
    }

    fn violation(kind: ViolationKind, severity: Severity) -> Violation {
        let action = match severity {
            Severity::Critical => RecommendedAction::BlockAccess,
            _ => RecommendedAction::WarnUser,
        };
        Violation::new(kind, severity, "test", action)
    }

    #[tokio::test]
    async fn none_has_no_side_effects() {
        let (controller, port, sink) = setup(Reply::Primary);

        let handle = controller.apply(&EnforcementAction::none(), None).await;

        assert!(handle.is_none());
        assert!(port.notices().is_empty());
        assert_eq!(sink.current_seq(), 0);
    }

    #[tokio::test]
    async fn force_exit_emits_critical_then_terminates() {
        let (controller, port, sink) = setup(Reply::Primary);
        let action = PolicyEngine::decide(&[violation(ViolationKind::Emulator, Severity::Critical)]);

        controller.apply(&action, None).await.unwrap().await.unwrap();

        let events = sink.events_from(0).await;
        assert_eq!(events[0].1.kind, SecurityEventKind::CriticalViolation);
        assert_eq!(events[0].1.get_str("action"), Some("force_exit"));
        assert_eq!(events[1].1.get_str("action"), Some("user_forced_exit"));
        assert_eq!(port.terminations(), 1);

        let notices = port.notices();
        assert_eq!(notices[0].level, NoticeLevel::Blocking);
        assert_eq!(notices[0].actions, vec![NoticeAction::Exit]);
    }

    #[tokio::test]
    async fn force_exit_terminates_even_when_notice_is_dropped() {
        let (controller, port, sink) = setup(Reply::Drop);
        let action = PolicyEngine::decide(&[violation(ViolationKind::Root, Severity::Critical)]);

        controller.apply(&action, None).await.unwrap().await.unwrap();

        assert_eq!(port.terminations(), 1);
        // No user confirmation was logged
        assert_eq!(sink.current_seq(), 1);
    }

    #[tokio::test]
    async fn force_exit_waits_for_user_before_terminating() {
        let (controller, port, _sink) = setup(Reply::Hold);
        let action = PolicyEngine::decide(&[violation(ViolationKind::Root, Severity::Critical)]);

        let handle = controller.apply(&action, None).await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(port.terminations(), 0);

        port.respond_pending(NoticeAction::Exit);
        handle.await.unwrap();
        assert_eq!(port.terminations(), 1);
    }

    #[tokio::test]
    async fn warn_user_emits_violation_and_logs_acknowledgement() {
        let (controller, port, sink) = setup(Reply::Primary);
        let action =
            PolicyEngine::decide(&[violation(ViolationKind::DeveloperOptions, Severity::High)]);

        controller.apply(&action, None).await.unwrap().await.unwrap();

        let events = sink
            .events_of_kind(SecurityEventKind::SecurityViolation)
            .await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].1.get_str("action"), Some("warn_user"));
        assert_eq!(
            events[0].1.get("kinds"),
            Some(&serde_json::json!(["developer_options"]))
        );
        assert_eq!(events[1].1.get_str("action"), Some("user_acknowledged"));
        assert_eq!(port.terminations(), 0);
        assert!(port.notices()[0].dismissible);
    }

    #[tokio::test]
    async fn dismissed_warning_logs_nothing_further() {
        let (controller, _port, sink) = setup(Reply::Drop);
        let action = PolicyEngine::decide(&[violation(ViolationKind::AppIntegrity, Severity::High)]);

        controller.apply(&action, None).await.unwrap().await.unwrap();

        assert_eq!(sink.current_seq(), 1);
    }
}
