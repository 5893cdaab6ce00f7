//! Builds a DeviceSignals snapshot from provider probes
//!
//! Probe errors are converted into unknown facts here; they never abort
//! collection.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, warn};

use super::traits::SignalProvider;
use super::types::{DeviceInfoFacts, DeviceSignals, SignalKind};

/// Query every trust probe and assemble one snapshot
///
/// `device` carries the device facts read at initialization; `None` means
/// the device info query failed, which leaves the debug-build fact unknown.
pub async fn collect_signals(
    provider: &dyn SignalProvider,
    device: Option<&DeviceInfoFacts>,
) -> DeviceSignals {
    let (emulator, root, developer_options) = tokio::join!(
        provider.query_emulator(),
        provider.query_root(),
        provider.query_developer_options(),
    );

    let mut evidence = BTreeMap::new();

    let is_emulator = match emulator {
        Ok(probe) => {
            evidence.insert(SignalKind::Emulator, probe.reason);
            Some(probe.is_emulator)
        }
        Err(e) => {
            warn!(signal = %SignalKind::Emulator, error = %e, "Probe failed, signal unknown");
            None
        }
    };

    let is_rooted = match root {
        Ok(probe) => {
            evidence.insert(SignalKind::Root, probe.reason);
            Some(probe.is_rooted)
        }
        Err(e) => {
            warn!(signal = %SignalKind::Root, error = %e, "Probe failed, signal unknown");
            None
        }
    };

    let developer_options_enabled = match developer_options {
        Ok(probe) => {
            evidence.insert(SignalKind::DeveloperOptions, probe.reason);
            Some(probe.enabled)
        }
        Err(e) => {
            warn!(
                signal = %SignalKind::DeveloperOptions,
                error = %e,
                "Probe failed, signal unknown"
            );
            None
        }
    };

    if device.is_none() {
        warn!(signal = %SignalKind::DebugBuild, "Device info unavailable, signal unknown");
    }

    let signals = DeviceSignals {
        is_emulator,
        is_rooted,
        developer_options_enabled,
        is_debug_build: device.map(|d| d.is_debuggable),
        manufacturer: device.map(|d| d.manufacturer.clone()),
        model: device.map(|d| d.model.clone()),
        os_version_code: device.map(|d| d.os_version_code),
        evidence,
        captured_at: Utc::now(),
    };

    debug!(unknown = ?signals.unknown_signals(), "Collected device signals");
    signals
}
