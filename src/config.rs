use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Event name the host listens on for callback results.
pub const DEFAULT_CALLBACK_EVENT: &str = "MapboxAndroidCallback";
/// Camera animation length used when a command asks for `animated`.
pub const DEFAULT_ANIMATION_DURATION_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default = "default_callback_event")]
    pub callback_event: String,
    #[serde(default = "default_animation_duration_ms")]
    pub animation_duration_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read bridge config {}", path.display()))?;
        Self::from_toml(&raw)
            .with_context(|| format!("failed to parse bridge config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            callback_event: default_callback_event(),
            animation_duration_ms: default_animation_duration_ms(),
            log_level: default_log_level(),
        }
    }
}

fn default_callback_event() -> String {
    DEFAULT_CALLBACK_EVENT.to_string()
}

fn default_animation_duration_ms() -> u64 {
    DEFAULT_ANIMATION_DURATION_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(BridgeConfig::from_toml("").unwrap(), BridgeConfig::default());
    }

    #[test]
    fn load_reads_overrides_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "callback_event = \"MapCallback\"").unwrap();
        writeln!(file, "animation_duration_ms = 0").unwrap();
        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.callback_event, "MapCallback");
        assert_eq!(config.animation_duration(), Duration::ZERO);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = BridgeConfig::load(Path::new("/nonexistent/bridge.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bridge.toml"));
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(BridgeConfig::from_toml("animation_duration_ms = \"slow\"").is_err());
    }
}
