//! Server configuration
//!
//! Read from an optional JSON file; every field has a default so an empty
//! object (or no file at all) is a valid configuration. Command-line flags
//! override individual fields afterwards.

use crate::device::{DeviceTable, DEFAULT_FALLBACK_DEVICE};
use crate::error::DeviceTableError;
use crate::layout::LayoutConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Request worker threads; 0 means one per available CPU
    #[serde(default)]
    pub workers: usize,
    /// Replacement device table in CSV form
    #[serde(default)]
    pub devices_csv: Option<PathBuf>,
    #[serde(default = "default_fallback_device")]
    pub fallback_device: String,
    /// File name advertised in `Content-Disposition`
    #[serde(default = "default_download_name")]
    pub download_name: String,
    #[serde(default)]
    pub layout: LayoutConfig,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_fallback_device() -> String {
    DEFAULT_FALLBACK_DEVICE.to_string()
}

fn default_download_name() -> String {
    "memento-mori.png".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            workers: 0,
            devices_csv: None,
            fallback_device: default_fallback_device(),
            download_name: default_download_name(),
            layout: LayoutConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: ServerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let gap = self.layout.gap_ratio;
        if !(0.0..1.0).contains(&gap) {
            anyhow::bail!("gap_ratio must be in [0, 1), got {}", gap);
        }
        if self.download_name.contains(['"', '\r', '\n']) {
            anyhow::bail!("download_name must not contain quotes or line breaks");
        }
        Ok(())
    }

    /// Number of request workers to start
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }

    /// Build the device table this configuration describes
    pub fn load_devices(&self) -> Result<DeviceTable, DeviceTableError> {
        match &self.devices_csv {
            Some(path) => DeviceTable::from_csv_path(path, &self.fallback_device),
            None => DeviceTable::builtin()?.with_fallback(&self.fallback_device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServerConfig::from_json("{}").unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.fallback_device, "iphone-16-pro");
        assert_eq!(config.download_name, "memento-mori.png");
        assert_eq!(config.layout.gap_ratio, 0.2);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_json(
            r#"{"bind":"0.0.0.0:8080","workers":2,"fallback_device":"iphone-15-pro","layout":{"gap_ratio":0.25}}"#,
        )
        .unwrap();
        assert_eq!(config.worker_count(), 2);
        assert_eq!(config.layout.gap_ratio, 0.25);
        assert_eq!(config.load_devices().unwrap().fallback().id, "iphone-15-pro");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ServerConfig::from_json(r#"{"layout":{"gap_ratio":1.5}}"#).is_err());
        assert!(ServerConfig::from_json(r#"{"download_name":"a\"b.png"}"#).is_err());
        assert!(ServerConfig::from_json(r#"{"port":3000}"#).is_err());
    }

    #[test]
    fn test_unknown_fallback_fails_to_load() {
        let config = ServerConfig {
            fallback_device: "galaxy-s24".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.load_devices().is_err());
    }
}
