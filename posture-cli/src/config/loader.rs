use super::types::{
    DEFAULT_MANUFACTURER, DEFAULT_MODEL, DEFAULT_OS_VERSION_CODE, DeviceProfile, PostureConfig,
    RawDeviceProfile, RawEngineConfig, RawPostureConfig,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use posture_core::EngineConfig;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + explicit file)
    pub fn load(explicit: Option<&Path>) -> Result<PostureConfig> {
        let mut raw = RawPostureConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        // Layer 3: --config, which must exist
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        }

        // Convert to final config with defaults applied
        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<RawPostureConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "posture").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with POSTURE_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("POSTURE_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".posture/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawPostureConfig, overlay: RawPostureConfig) -> RawPostureConfig {
        RawPostureConfig {
            engine: RawEngineConfig {
                security_level: overlay.engine.security_level.or(base.engine.security_level),
                degrade_on_high_severity: overlay
                    .engine
                    .degrade_on_high_severity
                    .or(base.engine.degrade_on_high_severity),
                event_capacity: overlay.engine.event_capacity.or(base.engine.event_capacity),
                recheck_interval_secs: overlay
                    .engine
                    .recheck_interval_secs
                    .or(base.engine.recheck_interval_secs),
            },
            device: RawDeviceProfile {
                available: overlay.device.available.or(base.device.available),
                emulator: overlay.device.emulator.or(base.device.emulator),
                rooted: overlay.device.rooted.or(base.device.rooted),
                developer_options: overlay
                    .device
                    .developer_options
                    .or(base.device.developer_options),
                debug_build: overlay.device.debug_build.or(base.device.debug_build),
                manufacturer: overlay.device.manufacturer.or(base.device.manufacturer),
                model: overlay.device.model.or(base.device.model),
                os_version_code: overlay.device.os_version_code.or(base.device.os_version_code),
                failing_probes: overlay.device.failing_probes.or(base.device.failing_probes),
                protection_error: overlay.device.protection_error.or(base.device.protection_error),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawPostureConfig) -> PostureConfig {
        let defaults = EngineConfig::default();
        PostureConfig {
            engine: EngineConfig {
                security_level: raw.engine.security_level.unwrap_or(defaults.security_level),
                degrade_on_high_severity: raw
                    .engine
                    .degrade_on_high_severity
                    .unwrap_or(defaults.degrade_on_high_severity),
                event_capacity: raw.engine.event_capacity.unwrap_or(defaults.event_capacity),
                recheck_interval_secs: raw
                    .engine
                    .recheck_interval_secs
                    .unwrap_or(defaults.recheck_interval_secs),
            },
            device: DeviceProfile {
                available: raw.device.available.unwrap_or(true),
                emulator: raw.device.emulator.unwrap_or(false),
                rooted: raw.device.rooted.unwrap_or(false),
                developer_options: raw.device.developer_options.unwrap_or(false),
                debug_build: raw.device.debug_build.unwrap_or(false),
                manufacturer: raw
                    .device
                    .manufacturer
                    .unwrap_or_else(|| DEFAULT_MANUFACTURER.to_string()),
                model: raw.device.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                os_version_code: raw.device.os_version_code.unwrap_or(DEFAULT_OS_VERSION_CODE),
                failing_probes: raw.device.failing_probes.unwrap_or_default(),
                protection_error: raw.device.protection_error,
            },
        }
    }
}
