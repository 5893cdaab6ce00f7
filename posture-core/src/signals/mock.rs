//! Mock signal provider for testing and simulated device profiles
//!
//! MockSignalProvider answers every probe from a script that can be changed
//! between check cycles, and counts every call so tests can assert how many
//! native round-trips an operation made.
//!
//! The CLI harness also uses it to simulate a device described in TOML.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::traits::SignalProvider;
use super::types::{DeveloperOptionsProbe, DeviceInfoFacts, EmulatorProbe, RootProbe, SignalKind};
use crate::error::ProbeError;

/// Scripted answers for each provider operation
#[derive(Debug, Clone)]
pub struct ProbeScript {
    pub emulator: Result<EmulatorProbe, ProbeError>,
    pub root: Result<RootProbe, ProbeError>,
    pub developer_options: Result<DeveloperOptionsProbe, ProbeError>,
    pub device_info: Result<DeviceInfoFacts, ProbeError>,
    pub enable_protection: Result<(), ProbeError>,
    pub disable_protection: Result<(), ProbeError>,
}

impl Default for ProbeScript {
    /// A genuine, unrooted device with a release build
    fn default() -> Self {
        Self {
            emulator: Ok(EmulatorProbe {
                is_emulator: false,
                reason: "physical device".to_string(),
            }),
            root: Ok(RootProbe {
                is_rooted: false,
                reason: "device not rooted".to_string(),
            }),
            developer_options: Ok(DeveloperOptionsProbe {
                enabled: false,
                usb_debugging_enabled: false,
                reason: "developer options disabled".to_string(),
            }),
            device_info: Ok(DeviceInfoFacts {
                manufacturer: "Google".to_string(),
                model: "Pixel 8".to_string(),
                brand: "google".to_string(),
                os_version_code: 34,
                os_release: "14".to_string(),
                build_tags: "release-keys".to_string(),
                build_type: "user".to_string(),
                is_debuggable: false,
            }),
            enable_protection: Ok(()),
            disable_protection: Ok(()),
        }
    }
}

/// Number of calls made to each provider operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderCalls {
    pub availability_checks: usize,
    pub emulator: usize,
    pub root: usize,
    pub developer_options: usize,
    pub device_info: usize,
    pub enable_protection: usize,
    pub disable_protection: usize,
}

impl ProviderCalls {
    /// Calls that reached a native probe or toggle (capability checks excluded)
    pub fn native_calls(&self) -> usize {
        self.emulator
            + self.root
            + self.developer_options
            + self.device_info
            + self.enable_protection
            + self.disable_protection
    }
}

#[derive(Debug, Default)]
struct CallCounters {
    availability_checks: AtomicUsize,
    emulator: AtomicUsize,
    root: AtomicUsize,
    developer_options: AtomicUsize,
    device_info: AtomicUsize,
    enable_protection: AtomicUsize,
    disable_protection: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// Scriptable implementation of SignalProvider
pub struct MockSignalProvider {
    available: AtomicBool,
    script: Mutex<ProbeScript>,
    calls: CallCounters,
}

impl MockSignalProvider {
    /// Available provider reporting a clean device
    pub fn new() -> Self {
        Self::with_script(ProbeScript::default())
    }

    /// Available provider answering from `script`
    pub fn with_script(script: ProbeScript) -> Self {
        Self {
            available: AtomicBool::new(true),
            script: Mutex::new(script),
            calls: CallCounters::default(),
        }
    }

    /// Provider whose native capability is missing
    pub fn unavailable() -> Self {
        let provider = Self::new();
        provider.available.store(false, Ordering::SeqCst);
        provider
    }

    /// Report the device as an emulator (or not)
    #[must_use]
    pub fn with_emulator(self, is_emulator: bool) -> Self {
        self.set_emulator(is_emulator);
        self
    }

    /// Report the device as rooted (or not)
    #[must_use]
    pub fn with_root(self, is_rooted: bool) -> Self {
        self.set_root(is_rooted);
        self
    }

    /// Report developer options as enabled (or not)
    #[must_use]
    pub fn with_developer_options(self, enabled: bool) -> Self {
        self.set_developer_options(enabled);
        self
    }

    /// Report the application build as debuggable (or not)
    #[must_use]
    pub fn with_debug_build(self, debuggable: bool) -> Self {
        self.set_debug_build(debuggable);
        self
    }

    /// Make one probe fail
    #[must_use]
    pub fn with_failing_probe(self, kind: SignalKind, message: &str) -> Self {
        self.fail_probe(kind, message);
        self
    }

    /// Make enabling capture protection fail
    #[must_use]
    pub fn with_failing_protection(self, message: &str) -> Self {
        self.script.lock().enable_protection = Err(ProbeError::new(message));
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_emulator(&self, is_emulator: bool) {
        let reason = if is_emulator {
            "build properties match a known emulator"
        } else {
            "physical device"
        };
        self.script.lock().emulator = Ok(EmulatorProbe {
            is_emulator,
            reason: reason.to_string(),
        });
    }

    pub fn set_root(&self, is_rooted: bool) {
        let reason = if is_rooted {
            "su binary found at /system/xbin/su"
        } else {
            "device not rooted"
        };
        self.script.lock().root = Ok(RootProbe {
            is_rooted,
            reason: reason.to_string(),
        });
    }

    pub fn set_developer_options(&self, enabled: bool) {
        let reason = if enabled {
            "developer options enabled"
        } else {
            "developer options disabled"
        };
        self.script.lock().developer_options = Ok(DeveloperOptionsProbe {
            enabled,
            usb_debugging_enabled: enabled,
            reason: reason.to_string(),
        });
    }

    pub fn set_debug_build(&self, debuggable: bool) {
        let mut script = self.script.lock();
        let mut facts = script.device_info.clone().unwrap_or_default();
        facts.is_debuggable = debuggable;
        script.device_info = Ok(facts);
    }

    pub fn set_device_info(&self, facts: DeviceInfoFacts) {
        self.script.lock().device_info = Ok(facts);
    }

    /// Make the probe behind `kind` fail; `DebugBuild` fails the device info query
    pub fn fail_probe(&self, kind: SignalKind, message: &str) {
        let error = ProbeError::new(message);
        let mut script = self.script.lock();
        match kind {
            SignalKind::Emulator => script.emulator = Err(error),
            SignalKind::Root => script.root = Err(error),
            SignalKind::DeveloperOptions => script.developer_options = Err(error),
            SignalKind::DebugBuild => script.device_info = Err(error),
        }
    }

    /// Set the outcome of the next capture protection enable calls
    pub fn set_protection_result(&self, result: Result<(), ProbeError>) {
        self.script.lock().enable_protection = result;
    }

    /// Snapshot of the call counters
    pub fn calls(&self) -> ProviderCalls {
        let load = |c: &AtomicUsize| c.load(Ordering::SeqCst);
        ProviderCalls {
            availability_checks: load(&self.calls.availability_checks),
            emulator: load(&self.calls.emulator),
            root: load(&self.calls.root),
            developer_options: load(&self.calls.developer_options),
            device_info: load(&self.calls.device_info),
            enable_protection: load(&self.calls.enable_protection),
            disable_protection: load(&self.calls.disable_protection),
        }
    }
}

impl Default for MockSignalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalProvider for MockSignalProvider {
    fn is_available(&self) -> bool {
        bump(&self.calls.availability_checks);
        self.available.load(Ordering::SeqCst)
    }

    async fn query_emulator(&self) -> Result<EmulatorProbe, ProbeError> {
        bump(&self.calls.emulator);
        self.script.lock().emulator.clone()
    }

    async fn query_root(&self) -> Result<RootProbe, ProbeError> {
        bump(&self.calls.root);
        self.script.lock().root.clone()
    }

    async fn query_developer_options(&self) -> Result<DeveloperOptionsProbe, ProbeError> {
        bump(&self.calls.developer_options);
        self.script.lock().developer_options.clone()
    }

    async fn query_device_info(&self) -> Result<DeviceInfoFacts, ProbeError> {
        bump(&self.calls.device_info);
        self.script.lock().device_info.clone()
    }

    async fn enable_capture_protection(&self) -> Result<(), ProbeError> {
        bump(&self.calls.enable_protection);
        self.script.lock().enable_protection.clone()
    }

    async fn disable_capture_protection(&self) -> Result<(), ProbeError> {
        bump(&self.calls.disable_protection);
        self.script.lock().disable_protection.clone()
    }
}
