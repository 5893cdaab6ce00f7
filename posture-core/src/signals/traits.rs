//! SignalProvider trait
//!
//! The provider abstraction lets the engine run against any platform probe
//! implementation (native module, test double, simulated profile).

use async_trait::async_trait;

use super::types::{DeveloperOptionsProbe, DeviceInfoFacts, EmulatorProbe, RootProbe};
use crate::error::ProbeError;

/// Platform capability that supplies raw device-trust facts
///
/// Every probe is independently fallible. Presence of the capability itself
/// is reported separately by [`SignalProvider::is_available`] and is checked
/// once per `initialize()`.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Whether the native capability exists on this platform
    fn is_available(&self) -> bool;

    /// Detect whether the device is an emulator
    async fn query_emulator(&self) -> Result<EmulatorProbe, ProbeError>;

    /// Detect root access
    async fn query_root(&self) -> Result<RootProbe, ProbeError>;

    /// Detect developer options / USB debugging
    async fn query_developer_options(&self) -> Result<DeveloperOptionsProbe, ProbeError>;

    /// Read device identity and build facts
    async fn query_device_info(&self) -> Result<DeviceInfoFacts, ProbeError>;

    /// Turn on screen-capture protection
    async fn enable_capture_protection(&self) -> Result<(), ProbeError>;

    /// Turn off screen-capture protection
    async fn disable_capture_protection(&self) -> Result<(), ProbeError>;
}
