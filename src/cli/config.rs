//! TOML configuration file support.
//!
//! Settings shared by every export can live in a config file instead of
//! being repeated on the command line:
//!
//! ```toml
//! # ngff-export.toml
//! [export]
//! chunk_size = 1024
//! min_level_size = 256
//! cache = true
//! cache_dir = "/scratch/planes"
//! ```
//!
//! Command-line flags take precedence over file values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure for ngff-export.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Configuration shared by the export commands.
#[derive(Debug, Default, Deserialize)]
pub struct ExportConfig {
    /// Square spatial chunk edge in pixels.
    pub chunk_size: Option<usize>,

    /// Largest extent of the smallest pyramid level.
    pub min_level_size: Option<usize>,

    /// Cache fetched planes.
    pub cache: Option<bool>,

    /// Plane cache directory (implies `cache = true`).
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [export]
            chunk_size = 1024
            min_level_size = 256
            cache = true
            cache_dir = "/scratch/planes"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.export.chunk_size, Some(1024));
        assert_eq!(config.export.min_level_size, Some(256));
        assert_eq!(config.export.cache, Some(true));
        assert_eq!(config.export.cache_dir, Some(PathBuf::from("/scratch/planes")));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [export]
            chunk_size = 512
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.export.chunk_size, Some(512));
        assert_eq!(config.export.cache, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.export.chunk_size, None);
        assert!(Config::load(None).unwrap().export.cache_dir.is_none());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_str("[export]\nchunk_size = \"big\"").is_err());
    }
}
