//! User configuration stored in `config.json`.

use crate::paths::Paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The codegame-share instance to use.
    pub share_url: String,
    /// The port to use for `codegame run`.
    pub dev_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            share_url: "share.code-game.org".to_string(),
            dev_port: 8080,
        }
    }
}

impl Config {
    /// Read the config file. Missing fields, a missing file or an unreadable
    /// file all fall back to the defaults.
    pub fn load(paths: &Paths) -> Self {
        let path = paths.config_file();
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to decode config file");
                Self::default()
            }
        }
    }

    /// Create or overwrite the config file.
    pub fn save(&self, paths: &Paths) -> Result<()> {
        fs::create_dir_all(&paths.config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                paths.config_dir.display()
            )
        })?;

        let path = paths.config_file();
        let json = serde_json::to_string_pretty(self).context("Failed to encode config file")?;
        fs::write(&path, json + "\n")
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::under(dir.path());
        assert_eq!(Config::load(&paths), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::under(dir.path());
        fs::create_dir_all(&paths.config_dir).unwrap();
        fs::write(paths.config_file(), r#"{"dev_port": 9000}"#).unwrap();

        let config = Config::load(&paths);
        assert_eq!(config.dev_port, 9000);
        assert_eq!(config.share_url, "share.code-game.org");
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::under(dir.path());
        fs::create_dir_all(&paths.config_dir).unwrap();
        fs::write(paths.config_file(), "{ not json").unwrap();

        assert_eq!(Config::load(&paths), Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::under(dir.path());
        let config = Config {
            share_url: "share.example.com".to_string(),
            dev_port: 3000,
        };

        config.save(&paths).unwrap();
        assert_eq!(Config::load(&paths), config);
    }
}
