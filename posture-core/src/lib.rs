//! posture-core: Device security posture evaluation and enforcement
//!
//! This crate decides whether the device and application it runs on are
//! trustworthy enough to show protected content:
//!
//! - **Signals** - [`SignalProvider`] trait over the platform probes, with
//!   [`collect_signals`] building one [`DeviceSignals`] snapshot per cycle
//! - **Policy** - [`classify`] and the zero-tolerance [`PolicyEngine`]
//! - **Enforcement** - [`EnforcementController`] driving an injected
//!   [`EnforcementPort`] with [`Notice`] values
//! - **Events** - [`EventSink`] audit trail and [`MemoryEventSink`]
//! - **State** - [`SecurityStateManager`] owning the lifecycle, and
//!   [`RecheckMonitor`] for periodic rechecks
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use posture_core::{EngineConfig, MockSignalProvider, RecordingPort, SecurityStateManager};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = SecurityStateManager::with_memory_sink(
//!         Arc::new(MockSignalProvider::new()),
//!         Arc::new(RecordingPort::new()),
//!         EngineConfig::default(),
//!     );
//!
//!     let summary = manager.initialize().await?;
//!     println!("protected: {}", summary.screenshot_protection_enabled);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//!  SignalProvider ──▶ collect_signals ──▶ PolicyEngine ──▶ EnforcementController
//!                                             │                   │
//!                                             ▼                   ▼
//!                                   SecurityStateManager   EnforcementPort
//!                                             │
//!                                             ▼
//!                                         EventSink
//! ```

pub mod config;
pub mod enforcement;
pub mod error;
pub mod events;
pub mod policy;
pub mod signals;
pub mod state;

// Re-export key types for convenience
pub use config::EngineConfig;
pub use enforcement::{
    EnforcementController, EnforcementPort, Notice, NoticeAction, NoticeLevel, RecordingPort, Reply,
};
pub use error::{FatalError, NotInitializedError, PostureError, ProbeError};
pub use events::{EventSeq, EventSink, MemoryEventSink, SecurityEvent, SecurityEventKind, event_stream};
pub use policy::{
    CycleOutcome, EnforcementAction, EnforcementKind, PolicyEngine, RecommendedAction, Severity,
    Violation, ViolationKind, classify,
};
pub use signals::{
    DeviceInfoFacts, DeviceSignals, MockSignalProvider, ProbeScript, ProviderCalls, SignalKind,
    SignalProvider, SlowSignalProvider, collect_signals,
};
pub use state::{
    DegradedReason, FeatureSupport, MonitorHandle, RecheckMonitor, SecurityLevel, SecurityState,
    SecurityStateManager, SecuritySummary, SelfCheck,
};
