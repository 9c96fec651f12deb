//! Filesystem locations and remote endpoints used by cgkit.
//!
//! Every component takes a [`Paths`] at construction instead of reading
//! process-wide globals, so tests can point the cache, session store and
//! remote hosts at temporary directories and mock servers.
//!
//! Defaults follow the XDG base directory layout:
//!
//! ```text
//! $XDG_CACHE_HOME/codegame/github_requests/   # conditional fetch cache
//! $XDG_DATA_HOME/codegame/games/              # session store
//! $XDG_DATA_HOME/codegame/bin/                # installed tools
//! $XDG_CONFIG_HOME/codegame/config.json       # user config
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "codegame";
const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";

#[derive(Debug, Clone)]
pub struct Paths {
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub bin_dir: PathBuf,
    /// Base URL of the tag listing API (no trailing slash)
    pub api_base: String,
    /// Base URL for raw repository files (no trailing slash)
    pub raw_base: String,
}

impl Paths {
    /// Platform-standard locations.
    pub fn from_env() -> Self {
        let data_dir = xdg_dir("XDG_DATA_HOME", ".local/share").join(APP_DIR);
        Self {
            cache_dir: xdg_dir("XDG_CACHE_HOME", ".cache")
                .join(APP_DIR)
                .join("github_requests"),
            bin_dir: data_dir.join("bin"),
            data_dir,
            config_dir: xdg_dir("XDG_CONFIG_HOME", ".config").join(APP_DIR),
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
        }
    }

    /// Put every directory below `root`. Remote endpoints keep their defaults.
    pub fn under(root: &Path) -> Self {
        Self {
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
            config_dir: root.join("config"),
            bin_dir: root.join("data").join("bin"),
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
        }
    }

    /// Point both the tag API and raw file host at `base` (used with mock servers).
    pub fn with_remote(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.api_base = base.to_string();
        self.raw_base = base.to_string();
        self
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("games")
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::from_env()
    }
}

fn xdg_dir(var: &str, home_fallback: &str) -> PathBuf {
    if let Some(dir) = std::env::var_os(var).filter(|d| !d.is_empty()) {
        PathBuf::from(dir)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(home_fallback)
    } else {
        PathBuf::from(home_fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_root() {
        let paths = Paths::under(Path::new("/tmp/cg"));
        assert_eq!(paths.cache_dir, PathBuf::from("/tmp/cg/cache"));
        assert_eq!(paths.bin_dir, PathBuf::from("/tmp/cg/data/bin"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/cg/config/config.json"));
        assert_eq!(paths.sessions_dir(), PathBuf::from("/tmp/cg/data/games"));
    }

    #[test]
    fn test_with_remote_trims_slash() {
        let paths = Paths::under(Path::new("/tmp/cg")).with_remote("http://127.0.0.1:9000/");
        assert_eq!(paths.api_base, "http://127.0.0.1:9000");
        assert_eq!(paths.raw_base, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_default_dirs_are_namespaced() {
        let paths = Paths::from_env();
        assert!(paths.cache_dir.ends_with("codegame/github_requests"));
        assert!(paths.bin_dir.ends_with("codegame/bin"));
        assert_eq!(paths.api_base, "https://api.github.com");
    }
}
