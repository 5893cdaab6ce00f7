use posture_core::{
    DeviceInfoFacts, EngineConfig, MockSignalProvider, ProbeError, SecurityLevel, SignalKind,
};
use serde::{Deserialize, Serialize};

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPostureConfig {
    #[serde(default)]
    pub engine: RawEngineConfig,

    #[serde(default)]
    pub device: RawDeviceProfile,
}

/// Engine config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawEngineConfig {
    pub security_level: Option<SecurityLevel>,
    pub degrade_on_high_severity: Option<bool>,
    pub event_capacity: Option<usize>,
    pub recheck_interval_secs: Option<u64>,
}

/// Device profile as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDeviceProfile {
    pub available: Option<bool>,
    pub emulator: Option<bool>,
    pub rooted: Option<bool>,
    pub developer_options: Option<bool>,
    pub debug_build: Option<bool>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub os_version_code: Option<u32>,
    pub failing_probes: Option<Vec<SignalKind>>,
    pub protection_error: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PostureConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub device: DeviceProfile,
}

/// Simulated device the CLI checks against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceProfile {
    /// Whether the native provider capability is present
    pub available: bool,
    pub emulator: bool,
    pub rooted: bool,
    pub developer_options: bool,
    pub debug_build: bool,
    pub manufacturer: String,
    pub model: String,
    pub os_version_code: u32,
    /// Probes that fail instead of answering
    #[serde(default)]
    pub failing_probes: Vec<SignalKind>,
    /// Error returned when enabling capture protection, if it should fail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection_error: Option<String>,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            available: true,
            emulator: false,
            rooted: false,
            developer_options: false,
            debug_build: false,
            manufacturer: DEFAULT_MANUFACTURER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            os_version_code: DEFAULT_OS_VERSION_CODE,
            failing_probes: Vec::new(),
            protection_error: None,
        }
    }
}

impl DeviceProfile {
    /// Build a provider that answers like this device
    pub fn provider(&self) -> MockSignalProvider {
        let provider = MockSignalProvider::new();
        provider.set_device_info(DeviceInfoFacts {
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
            brand: self.manufacturer.to_lowercase(),
            os_version_code: self.os_version_code,
            is_debuggable: self.debug_build,
            ..Default::default()
        });
        provider.set_available(self.available);
        provider.set_emulator(self.emulator);
        provider.set_root(self.rooted);
        provider.set_developer_options(self.developer_options);

        for kind in &self.failing_probes {
            provider.fail_probe(*kind, "probe failed in device profile");
        }
        if let Some(error) = &self.protection_error {
            provider.set_protection_result(Err(ProbeError::new(error.clone())));
        }
        provider
    }
}

pub const DEFAULT_MANUFACTURER: &str = "Google";
pub const DEFAULT_MODEL: &str = "Pixel 8";
pub const DEFAULT_OS_VERSION_CODE: u32 = 34;

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::SignalProvider;

    #[test]
    fn test_default_values() {
        let config = PostureConfig::default();
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.device.available);
        assert!(!config.device.rooted);
        assert_eq!(config.device.model, DEFAULT_MODEL);
        assert!(config.device.failing_probes.is_empty());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PostureConfig {
            engine: EngineConfig {
                security_level: SecurityLevel::High,
                ..Default::default()
            },
            device: DeviceProfile {
                rooted: true,
                failing_probes: vec![SignalKind::Emulator],
                protection_error: Some("no window".to_string()),
                ..Default::default()
            },
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: PostureConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[device]
rooted = true
failing_probes = ["developer_options"]
"#;
        let raw: RawPostureConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.device.rooted, Some(true));
        assert!(raw.device.emulator.is_none());
        assert_eq!(
            raw.device.failing_probes,
            Some(vec![SignalKind::DeveloperOptions])
        );
        assert!(raw.engine.security_level.is_none());
    }

    #[tokio::test]
    async fn test_profile_provider_answers_from_profile() {
        let profile = DeviceProfile {
            emulator: true,
            debug_build: true,
            model: "sdk_gphone64".to_string(),
            failing_probes: vec![SignalKind::Root],
            ..Default::default()
        };
        let provider = profile.provider();

        assert!(provider.is_available());
        assert!(provider.query_emulator().await.unwrap().is_emulator);
        assert!(provider.query_root().await.is_err());
        let info = provider.query_device_info().await.unwrap();
        assert!(info.is_debuggable);
        assert_eq!(info.model, "sdk_gphone64");
        assert!(provider.enable_capture_protection().await.is_ok());
    }

    #[tokio::test]
    async fn test_profile_provider_unavailable_and_failing_protection() {
        let profile = DeviceProfile {
            available: false,
            protection_error: Some("secure flag rejected".to_string()),
            ..Default::default()
        };
        let provider = profile.provider();

        assert!(!provider.is_available());
        assert!(provider.enable_capture_protection().await.is_err());
    }
}
