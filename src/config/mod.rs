// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for yaict

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Dataset location and ingestion defaults
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Gallery server settings
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatasetConfig {
    #[serde(default = "default_root")]
    pub root: String,
    /// Extensions picked up by folder import, leading dot included
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Copy sibling caption files during folder import
    #[serde(default)]
    pub include_captions: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

// Default value functions
fn default_root() -> String { "./yaict_data".to_string() }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8050 }

fn default_image_extensions() -> Vec<String> {
    crate::dataset::IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            image_extensions: default_image_extensions(),
            include_captions: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl DatasetConfig {
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::YaictError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.dataset.root, "./yaict_data");
        assert_eq!(config.dataset.image_extensions, vec![".jpg", ".jpeg", ".png"]);
        assert_eq!(config.web.port, 8050);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "dataset": { "root": "/data/set" } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.dataset.root_path(), PathBuf::from("/data/set"));
        assert!(!config.dataset.include_captions);
        assert_eq!(config.web.host, "127.0.0.1");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.web.port = 9000;
        config.dataset.include_captions = true;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.web.port, 9000);
        assert!(loaded.dataset.include_captions);
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        match AppConfig::load(&path) {
            Err(crate::YaictError::Config(msg)) => assert!(msg.contains("Failed to parse config")),
            other => panic!("Expected config error, got {:?}", other.map(|_| ())),
        }
    }
}
