//! SecurityStateManager owns the security lifecycle
//!
//! All mutation goes through `initialize`, `recheck`, `reinitialize` and the
//! protection toggles. Each holds the cycle lock for its whole duration, so
//! they are atomic with respect to each other. Readers go through the
//! published snapshot and never wait for a cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::types::{DegradedReason, SecuritySummary, SecurityState};
use crate::config::EngineConfig;
use crate::enforcement::{EnforcementController, EnforcementPort, Notice};
use crate::error::{FatalError, NotInitializedError, ProbeError};
use crate::events::{EventSink, MemoryEventSink, SecurityEvent, SecurityEventKind};
use crate::policy::{CycleOutcome, PolicyEngine, Severity, ViolationKind};
use crate::signals::{DeviceInfoFacts, DeviceSignals, SignalKind, SignalProvider, collect_signals};

/// Mutable engine state guarded by the cycle lock
#[derive(Default)]
struct CycleState {
    policy: PolicyEngine,
    /// Device facts read at initialization, reused by rechecks
    device: Option<DeviceInfoFacts>,
    protection_enabled: bool,
    /// Error from the last failed enable during initialization
    protection_error: Option<String>,
    initialized_at: Option<DateTime<Utc>>,
}

/// Snapshot visible to readers
struct Published {
    state: SecurityState,
    summary: SecuritySummary,
}

/// Non-mutating diagnostic report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfCheck {
    pub initialized: bool,
    pub provider_available: bool,
    pub protection_enabled: bool,
    pub state: String,
    pub degraded_reasons: Vec<DegradedReason>,
    pub unknown_signals: Vec<SignalKind>,
    pub violation_count: u64,
}

/// Which protection features are usable right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSupport {
    pub screenshot_blocking: bool,
    pub emulator_detection: bool,
    pub root_detection: bool,
    pub developer_options_detection: bool,
}

/// Owns the SecurityState and drives check cycles
pub struct SecurityStateManager {
    provider: Arc<dyn SignalProvider>,
    sink: Arc<dyn EventSink>,
    controller: EnforcementController,
    config: EngineConfig,
    cycle: Mutex<CycleState>,
    published: RwLock<Published>,
    /// Bumped after every completed check cycle
    generation: AtomicU64,
    /// Follow-up tasks waiting on notice responses
    pending: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl SecurityStateManager {
    pub fn new(
        provider: Arc<dyn SignalProvider>,
        port: Arc<dyn EnforcementPort>,
        sink: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Self {
        let controller = EnforcementController::new(port, Arc::clone(&sink));
        let summary = SecuritySummary::empty(config.security_level);
        Self {
            provider,
            sink,
            controller,
            config,
            cycle: Mutex::new(CycleState::default()),
            published: RwLock::new(Published {
                state: SecurityState::Uninitialized,
                summary,
            }),
            generation: AtomicU64::new(0),
            pending: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Manager with an in-memory sink sized from `config`
    pub fn with_memory_sink(
        provider: Arc<dyn SignalProvider>,
        port: Arc<dyn EnforcementPort>,
        config: EngineConfig,
    ) -> Self {
        let sink = Arc::new(MemoryEventSink::new(config.event_capacity));
        Self::new(provider, port, sink, config)
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Lifecycle ====================

    /// Bring the engine up
    ///
    /// Idempotent once `Ready` or `Degraded`: the cached summary is returned
    /// without touching the provider. A `Fatal` engine stays fatal until
    /// [`reinitialize`](Self::reinitialize).
    pub async fn initialize(&self) -> Result<SecuritySummary, FatalError> {
        let mut cycle = self.cycle.lock().await;
        self.initialize_locked(&mut cycle).await
    }

    /// Re-run a check cycle on an initialized engine
    ///
    /// Callers that had to wait for an in-flight cycle receive that cycle's
    /// result instead of starting another.
    pub async fn recheck(&self) -> Result<SecuritySummary, NotInitializedError> {
        // Rejected up front so a call during `initialize()` never waits on it
        self.ensure_operational()?;

        let observed = self.generation.load(Ordering::SeqCst);
        let mut cycle = self.cycle.lock().await;

        // A reinitialize may have run while this call waited for the lock
        self.ensure_operational()?;

        if self.generation.load(Ordering::SeqCst) != observed {
            debug!("Recheck coalesced into the cycle that just completed");
            return Ok(self.get_summary());
        }

        if cycle.device.is_none() {
            cycle.device = self.query_device_info().await;
        }

        let (signals, outcome) = self.run_checks(&mut cycle).await;
        let summary = self.build_summary(&cycle, signals);
        let reasons = self.degraded_reasons(&cycle, &outcome);
        let state = self.publish_cycle(summary.clone(), reasons);

        debug!(state = %state, violations = outcome.violations.len(), "Recheck complete");
        Ok(summary)
    }

    fn ensure_operational(&self) -> Result<(), NotInitializedError> {
        let state = self.state();
        if state.is_operational() {
            return Ok(());
        }
        debug!(state = %state, "Recheck rejected");
        Err(NotInitializedError::new(state.name()))
    }

    /// Reset to `Uninitialized` and initialize again
    ///
    /// Clears the violation counter and the cached device facts.
    pub async fn reinitialize(&self) -> Result<SecuritySummary, FatalError> {
        let mut cycle = self.cycle.lock().await;
        info!("Reinitializing security engine");

        *cycle = CycleState::default();
        {
            let mut published = self.published.write();
            published.state = SecurityState::Uninitialized;
            published.summary = SecuritySummary::empty(self.config.security_level);
        }

        self.initialize_locked(&mut cycle).await
    }

    async fn initialize_locked(&self, cycle: &mut CycleState) -> Result<SecuritySummary, FatalError> {
        {
            let published = self.published.read();
            match &published.state {
                SecurityState::Ready { summary } | SecurityState::Degraded { summary, .. } => {
                    debug!("Already initialized, returning cached summary");
                    return Ok(summary.clone());
                }
                SecurityState::Fatal { .. } => {
                    return Err(FatalError::ProviderUnavailable);
                }
                SecurityState::Uninitialized | SecurityState::Initializing => {}
            }
        }

        self.published.write().state = SecurityState::Initializing;
        debug!("Security state: initializing");

        if !self.provider.is_available() {
            let error = FatalError::ProviderUnavailable;
            error!(error = %error, "Security engine initialization failed");
            {
                let mut published = self.published.write();
                published.summary = SecuritySummary::empty(self.config.security_level);
                published.state = SecurityState::Fatal {
                    reason: error.to_string(),
                };
            }
            self.sink
                .publish(
                    SecurityEvent::new(SecurityEventKind::InitFailed)
                        .with("reason", error.to_string())
                        .with("fatal", true),
                )
                .await;
            return Err(error);
        }

        cycle.device = self.query_device_info().await;
        cycle.initialized_at = Some(Utc::now());

        let (signals, outcome) = self.run_checks(cycle).await;

        match self.provider.enable_capture_protection().await {
            Ok(()) => {
                cycle.protection_enabled = true;
                cycle.protection_error = None;
                self.sink
                    .publish(SecurityEvent::new(SecurityEventKind::ProtectionEnabled))
                    .await;
            }
            Err(e) => {
                warn!(error = %e, "Screen capture protection unavailable");
                cycle.protection_enabled = false;
                cycle.protection_error = Some(e.message.clone());
                self.sink
                    .publish(
                        SecurityEvent::new(SecurityEventKind::SecurityViolation)
                            .with("condition", "protection_unavailable")
                            .with("error", &e.message),
                    )
                    .await;
            }
        }

        let summary = self.build_summary(cycle, signals);
        let reasons = self.degraded_reasons(cycle, &outcome);
        let state = self.publish_cycle(summary.clone(), reasons);

        let unknown = summary.unknown_signals();
        info!(
            state = %state,
            violations = summary.violation_count,
            protection = summary.screenshot_protection_enabled,
            "Security engine initialized"
        );
        self.sink
            .publish(
                SecurityEvent::new(SecurityEventKind::InitSuccess)
                    .with("state", state.name())
                    .with("security_level", self.config.security_level)
                    .with("protection_enabled", summary.screenshot_protection_enabled)
                    .with("violation_count", summary.violation_count)
                    .with("unknown_signals", &unknown),
            )
            .await;

        Ok(summary)
    }

    // ==================== Cycle ====================

    async fn query_device_info(&self) -> Option<DeviceInfoFacts> {
        match self.provider.query_device_info().await {
            Ok(facts) => Some(facts),
            Err(e) => {
                warn!(error = %e, "Device info unavailable");
                None
            }
        }
    }

    /// Collect signals, run the policy, emit detections and enforce
    async fn run_checks(&self, cycle: &mut CycleState) -> (DeviceSignals, CycleOutcome) {
        let signals = collect_signals(self.provider.as_ref(), cycle.device.as_ref()).await;
        let outcome = cycle.policy.run_cycle(&signals);

        if !outcome.unknown_signals.is_empty() {
            warn!(unknown = ?outcome.unknown_signals, "Some device signals could not be determined");
        }

        for violation in &outcome.violations {
            let kind = match violation.kind {
                ViolationKind::Emulator => SecurityEventKind::EmulatorDetected,
                ViolationKind::Root => SecurityEventKind::RootDetected,
                ViolationKind::DeveloperOptions => SecurityEventKind::DevOptionsDetected,
                _ => continue,
            };
            self.sink
                .publish(
                    SecurityEvent::new(kind)
                        .with("severity", violation.severity)
                        .with("reason", &violation.reason),
                )
                .await;
        }

        if let Some(handle) = self.controller.apply(&outcome.action, Some(&signals)).await {
            let mut pending = self.pending.lock();
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }

        (signals, outcome)
    }

    fn build_summary(&self, cycle: &CycleState, signals: DeviceSignals) -> SecuritySummary {
        SecuritySummary {
            screenshot_protection_enabled: cycle.protection_enabled,
            native_provider_available: true,
            security_level: self.config.security_level,
            violation_count: cycle.policy.violation_count(),
            last_check_at: Some(signals.captured_at),
            device_signals: Some(signals),
            initialized_at: cycle.initialized_at,
        }
    }

    fn degraded_reasons(&self, cycle: &CycleState, outcome: &CycleOutcome) -> Vec<DegradedReason> {
        let mut reasons: Vec<DegradedReason> = outcome
            .violations
            .iter()
            .filter(|v| {
                v.is_critical()
                    || (self.config.degrade_on_high_severity && v.severity == Severity::High)
            })
            .map(DegradedReason::from_violation)
            .collect();

        if let Some(error) = &cycle.protection_error {
            reasons.push(DegradedReason::ProtectionUnavailable {
                error: error.clone(),
            });
        }
        reasons
    }

    /// Swap in the result of a completed cycle
    fn publish_cycle(&self, summary: SecuritySummary, reasons: Vec<DegradedReason>) -> SecurityState {
        let state = if reasons.is_empty() {
            SecurityState::Ready {
                summary: summary.clone(),
            }
        } else {
            warn!(reasons = ?reasons, "Security state degraded");
            SecurityState::Degraded {
                summary: summary.clone(),
                reasons,
            }
        };

        {
            let mut published = self.published.write();
            published.summary = summary;
            published.state = state.clone();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        state
    }

    // ==================== Capture protection ====================

    /// Turn screen-capture protection on
    ///
    /// Succeeds without a provider call when already enabled. Success clears
    /// a pending protection failure and may return the engine to `Ready`.
    /// Only an initialized engine accepts the call; `initialize()` turns
    /// protection on itself.
    pub async fn enable_protection(&self) -> Result<(), ProbeError> {
        let mut cycle = self.cycle.lock().await;
        if cycle.protection_enabled {
            debug!("Capture protection already enabled");
            return Ok(());
        }
        let state = self.state();
        if state.is_fatal() || !self.provider.is_available() {
            return Err(ProbeError::new(FatalError::ProviderUnavailable.to_string()));
        }
        if !state.is_operational() {
            return Err(ProbeError::new(NotInitializedError::new(state.name()).to_string()));
        }

        if let Err(e) = self.provider.enable_capture_protection().await {
            warn!(error = %e, "Enabling capture protection failed");
            return Err(e);
        }

        cycle.protection_enabled = true;
        cycle.protection_error = None;
        self.update_published(|state, summary| {
            summary.screenshot_protection_enabled = true;
            let cleared = match state {
                SecurityState::Degraded { reasons, .. } => {
                    reasons.retain(|r| !matches!(r, DegradedReason::ProtectionUnavailable { .. }));
                    reasons.is_empty()
                }
                _ => false,
            };
            if cleared {
                *state = SecurityState::Ready {
                    summary: summary.clone(),
                };
            }
        });
        info!("Capture protection enabled");
        self.sink
            .publish(SecurityEvent::new(SecurityEventKind::ProtectionEnabled))
            .await;
        Ok(())
    }

    /// Turn screen-capture protection off
    pub async fn disable_protection(&self) -> Result<(), ProbeError> {
        let mut cycle = self.cycle.lock().await;
        if !cycle.protection_enabled {
            debug!("Capture protection already disabled");
            return Ok(());
        }

        self.provider.disable_capture_protection().await?;

        cycle.protection_enabled = false;
        self.update_published(|_, summary| summary.screenshot_protection_enabled = false);
        info!("Capture protection disabled");
        self.sink
            .publish(SecurityEvent::new(SecurityEventKind::ProtectionDisabled))
            .await;
        Ok(())
    }

    /// Edit the published summary and keep the state's copy in step
    fn update_published(&self, f: impl FnOnce(&mut SecurityState, &mut SecuritySummary)) {
        let mut published = self.published.write();
        let Published { state, summary } = &mut *published;
        f(state, summary);
        match state {
            SecurityState::Ready { summary: s } | SecurityState::Degraded { summary: s, .. } => {
                *s = summary.clone();
            }
            _ => {}
        }
    }

    // ==================== Readers ====================

    /// Last published summary; never waits for a running cycle
    pub fn get_summary(&self) -> SecuritySummary {
        self.published.read().summary.clone()
    }

    pub fn state(&self) -> SecurityState {
        self.published.read().state.clone()
    }

    /// Notice the UI should currently show, if any
    pub fn notice(&self) -> Option<Notice> {
        Notice::for_state(&self.published.read().state)
    }

    pub fn is_protection_enabled(&self) -> bool {
        self.published.read().summary.screenshot_protection_enabled
    }

    pub fn self_check(&self) -> SelfCheck {
        let published = self.published.read();
        SelfCheck {
            initialized: published.state.is_operational(),
            provider_available: self.provider.is_available(),
            protection_enabled: published.summary.screenshot_protection_enabled,
            state: published.state.name().to_string(),
            degraded_reasons: published.state.degraded_reasons().to_vec(),
            unknown_signals: published.summary.unknown_signals(),
            violation_count: published.summary.violation_count,
        }
    }

    pub fn feature_support(&self) -> FeatureSupport {
        let usable = self.state().is_operational() && self.provider.is_available();
        FeatureSupport {
            screenshot_blocking: usable,
            emulator_detection: usable,
            root_detection: usable,
            developer_options_detection: usable,
        }
    }

    /// Wait for outstanding notice follow-ups to finish
    pub async fn settle(&self) {
        loop {
            let handles: Vec<_> = self.pending.lock().drain(..).collect();
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Enforcement follow-up task failed");
                }
            }
        }
    }
}
