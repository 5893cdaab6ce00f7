//! Security lifecycle: state types, the manager and the recheck monitor

pub mod manager;
pub mod monitor;
pub mod types;

pub use manager::{FeatureSupport, SecurityStateManager, SelfCheck};
pub use monitor::{MonitorHandle, RecheckMonitor};
pub use types::{DegradedReason, SecurityLevel, SecurityState, SecuritySummary};
