//! Version glue for the `cg-gen-events` code generator.
//!
//! Schema files declare a CGE version (`0.4`); the generator is released as
//! tags (`v0.4.2`). [`EventsGenerator::ensure_installed`] maps one to the
//! other and hands the concrete version to an [`Installer`].

use crate::error::{CgError, Result};
use crate::github::{self, TagResolver};
use crate::installer::{InstallRequest, Installer, ReleaseInstaller};
use crate::paths::Paths;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const OWNER: &str = "code-game-project";
pub const TOOL: &str = "cg-gen-events";
pub const REPOSITORY_URL: &str = "https://github.com/code-game-project/cg-gen-events";

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct EventsFile {
    #[serde(default)]
    events: Vec<NamedItem>,
    #[serde(default)]
    commands: Vec<NamedItem>,
}

/// Event and command names declared by a game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventNames {
    pub events: Vec<String>,
    pub commands: Vec<String>,
}

pub struct EventsGenerator<I = ReleaseInstaller> {
    resolver: TagResolver,
    installer: I,
    bin_dir: PathBuf,
}

impl EventsGenerator<ReleaseInstaller> {
    pub fn new(paths: &Paths) -> Result<Self> {
        Ok(Self::with_installer(
            TagResolver::new(paths)?,
            ReleaseInstaller::new()?,
            paths.bin_dir.join(TOOL),
        ))
    }
}

impl<I: Installer> EventsGenerator<I> {
    pub fn with_installer(resolver: TagResolver, installer: I, bin_dir: PathBuf) -> Self {
        Self {
            resolver,
            installer,
            bin_dir,
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Install the newest release matching `cge_version` and return its executable name.
    ///
    /// Resolution and install errors are returned unchanged, so callers can
    /// tell [`CgError::TagNotFound`] apart from network trouble.
    pub async fn ensure_installed(&self, cge_version: &str) -> Result<String> {
        let tag = self.resolver.tag_for_version(OWNER, TOOL, cge_version).await?;
        let version = tag.strip_prefix('v').unwrap_or(&tag);
        debug!(cge_version, version, "installing cg-gen-events");

        let request = InstallRequest {
            tool: TOOL,
            repository_url: REPOSITORY_URL,
            version,
            install_dir: &self.bin_dir,
        };
        self.installer.install(&request).await
    }

    /// Latest CGE version in `x.y` form.
    pub async fn latest_version(&self) -> anyhow::Result<String> {
        let tag = self
            .resolver
            .latest_tag(OWNER, TOOL)
            .await
            .context("Couldn't determine the latest CGE version")?;
        Ok(github::resolved_version(&tag))
    }

    /// Generate code for `languages` from the schema at `cge_path` (file or URL).
    pub async fn run(
        &self,
        cge_version: &str,
        output_dir: &Path,
        cge_path: &str,
        languages: &str,
    ) -> Result<()> {
        let exe_name = self.ensure_installed(cge_version).await?;
        let exe = self.bin_dir.join(exe_name);

        let status = tokio::process::Command::new(&exe)
            .arg(cge_path)
            .arg("-l")
            .arg(languages)
            .arg("-o")
            .arg(output_dir)
            .status()
            .await?;

        if !status.success() {
            return Err(CgError::Install(format!(
                "{} exited with {}",
                exe.display(),
                status
            )));
        }
        Ok(())
    }

    /// Event and command names of the game served at `url`.
    ///
    /// Only works for CGE versions >= 0.3, which introduced the JSON output.
    pub async fn event_names(&self, url: &str, cge_version: &str) -> Result<EventNames> {
        let output = tempfile::tempdir()?;
        self.run(cge_version, output.path(), url, "json").await?;

        let content = std::fs::read_to_string(output.path().join("events.json"))?;
        parse_events_json(&content)
    }
}

fn parse_events_json(content: &str) -> Result<EventNames> {
    let file: EventsFile = serde_json::from_str(content)?;
    Ok(EventNames {
        events: file.events.into_iter().map(|e| e.name).collect(),
        commands: file.commands.into_iter().map(|c| c.name).collect(),
    })
}
