//! Raw device-trust signal types

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one device-trust fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Emulator,
    Root,
    DeveloperOptions,
    DebugBuild,
}

impl SignalKind {
    /// All signals, in classification order
    pub const ALL: [SignalKind; 4] = [
        SignalKind::Emulator,
        SignalKind::Root,
        SignalKind::DeveloperOptions,
        SignalKind::DebugBuild,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emulator => "emulator",
            Self::Root => "root",
            Self::DeveloperOptions => "developer_options",
            Self::DebugBuild => "debug_build",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the emulator probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatorProbe {
    pub is_emulator: bool,
    /// Which heuristic fired (or why the device looks genuine)
    pub reason: String,
}

/// Result of the root probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootProbe {
    pub is_rooted: bool,
    pub reason: String,
}

/// Result of the developer options probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeveloperOptionsProbe {
    pub enabled: bool,
    #[serde(default)]
    pub usb_debugging_enabled: bool,
    pub reason: String,
}

/// Static facts about the device and the running build
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceInfoFacts {
    pub manufacturer: String,
    pub model: String,
    #[serde(default)]
    pub brand: String,
    /// Platform API level (SDK int on Android)
    pub os_version_code: u32,
    #[serde(default)]
    pub os_release: String,
    #[serde(default)]
    pub build_tags: String,
    #[serde(default)]
    pub build_type: String,
    /// Whether the application build is debuggable
    pub is_debuggable: bool,
}

/// Immutable snapshot of all device-trust signals for one check cycle
///
/// Each fact is `None` when its probe failed. An unknown fact is never
/// treated as `false`: it contributes no violation and is reported through
/// [`DeviceSignals::unknown_signals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSignals {
    pub is_emulator: Option<bool>,
    pub is_rooted: Option<bool>,
    pub developer_options_enabled: Option<bool>,
    pub is_debug_build: Option<bool>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub os_version_code: Option<u32>,
    /// Probe-supplied explanation per signal
    #[serde(default)]
    pub evidence: BTreeMap<SignalKind, String>,
    pub captured_at: DateTime<Utc>,
}

impl DeviceSignals {
    /// A snapshot in which every fact is known and clean
    pub fn clean() -> Self {
        Self {
            is_emulator: Some(false),
            is_rooted: Some(false),
            developer_options_enabled: Some(false),
            is_debug_build: Some(false),
            manufacturer: None,
            model: None,
            os_version_code: None,
            evidence: BTreeMap::new(),
            captured_at: Utc::now(),
        }
    }

    /// A snapshot in which nothing could be determined
    pub fn unknown() -> Self {
        Self {
            is_emulator: None,
            is_rooted: None,
            developer_options_enabled: None,
            is_debug_build: None,
            ..Self::clean()
        }
    }

    /// The value of one fact, `None` when unknown
    pub fn fact(&self, kind: SignalKind) -> Option<bool> {
        match kind {
            SignalKind::Emulator => self.is_emulator,
            SignalKind::Root => self.is_rooted,
            SignalKind::DeveloperOptions => self.developer_options_enabled,
            SignalKind::DebugBuild => self.is_debug_build,
        }
    }

    /// Signals whose probe failed (degraded-confidence markers)
    pub fn unknown_signals(&self) -> Vec<SignalKind> {
        SignalKind::ALL
            .into_iter()
            .filter(|kind| self.fact(*kind).is_none())
            .collect()
    }

    /// True when every fact was determined
    pub fn is_complete(&self) -> bool {
        self.unknown_signals().is_empty()
    }

    pub fn evidence_for(&self, kind: SignalKind) -> Option<&str> {
        self.evidence.get(&kind).map(String::as_str)
    }
}
