//! Installing released tool executables.
//!
//! The [`Installer`] trait is the contract the version glue talks to: given a
//! tool, where its releases live and a concrete version, make sure the
//! executable exists in the install directory and return its file name.
//!
//! [`ReleaseInstaller`] implements it for GitHub style releases:
//!
//! ```text
//! {repository}/releases/download/v{version}/{tool}-{os}-{arch}.tar.gz
//!   -> {install_dir}/{tool}-{version}
//! ```
//!
//! Versions that are already present are never downloaded again.

use crate::error::{CgError, Result};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::future::Future;
use std::io::{self, Write};
use std::path::Path;
use tar::Archive;
use tracing::{debug, info};

/// What to install and where.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    pub tool: &'a str,
    /// Repository URL, e.g. `https://github.com/code-game-project/cg-gen-events`
    pub repository_url: &'a str,
    /// Version without the leading `v`
    pub version: &'a str,
    pub install_dir: &'a Path,
}

pub trait Installer {
    /// Make `request.version` of `request.tool` available in
    /// `request.install_dir` and return the executable's file name there.
    fn install(&self, request: &InstallRequest<'_>) -> impl Future<Output = Result<String>> + Send;
}

/// Downloads and unpacks release archives.
#[derive(Debug, Clone)]
pub struct ReleaseInstaller {
    client: reqwest::Client,
    show_progress: bool,
}

impl ReleaseInstaller {
    /// Downloads have no overall timeout; archives can be large.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("cgkit/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            show_progress: false,
        }
    }

    /// Draw a progress bar while downloading.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    async fn download(&self, url: &str, dir: &Path) -> Result<tempfile::NamedTempFile> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CgError::InvalidStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let pb = if self.show_progress {
            let pb = ProgressBar::new(response.content_length().unwrap_or(0));
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                    .map_err(|e| CgError::Other(e.into()))?
                    .progress_chars("#>-"),
            );
            pb.set_message("Downloading");
            Some(pb)
        } else {
            None
        };

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        let mut downloaded: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            if let Some(pb) = &pb {
                pb.set_position(downloaded);
            }
        }
        file.flush()?;

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        Ok(file)
    }
}

impl Installer for ReleaseInstaller {
    async fn install(&self, request: &InstallRequest<'_>) -> Result<String> {
        let exe_name = executable_name(request.tool, request.version);
        let target = request.install_dir.join(&exe_name);

        if target.exists() {
            debug!(tool = request.tool, version = request.version, "already installed");
            return Ok(exe_name);
        }

        fs::create_dir_all(request.install_dir)?;

        let url = release_asset_url(request);
        info!(tool = request.tool, version = request.version, %url, "installing");
        let archive = self.download(&url, request.install_dir).await?;
        extract_executable(archive.path(), request.tool, &target)?;

        Ok(exe_name)
    }
}

/// File name of an installed tool version.
pub fn executable_name(tool: &str, version: &str) -> String {
    format!("{}-{}{}", tool, version, std::env::consts::EXE_SUFFIX)
}

/// `{os}-{arch}` as used in release asset names.
pub fn platform_tag() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    };
    format!("{}-{}", os, arch)
}

pub fn release_asset_url(request: &InstallRequest<'_>) -> String {
    format!(
        "{}/releases/download/v{}/{}-{}.tar.gz",
        request.repository_url.trim_end_matches('/'),
        request.version,
        request.tool,
        platform_tag()
    )
}

/// Copy the `tool` binary out of a gzip'd tarball to `target`.
pub fn extract_executable(archive_path: &Path, tool: &str, target: &Path) -> Result<()> {
    let wanted = format!("{}{}", tool, std::env::consts::EXE_SUFFIX);
    let dir = target
        .parent()
        .ok_or_else(|| CgError::Install(format!("invalid install path: {}", target.display())))?;

    let mut archive = Archive::new(GzDecoder::new(fs::File::open(archive_path)?));
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let matches = entry
            .path()?
            .file_name()
            .is_some_and(|name| name.to_string_lossy() == wanted);
        if !matches {
            continue;
        }

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        io::copy(&mut entry, &mut temp)?;
        set_executable(temp.path())?;
        temp.persist(target)?;
        return Ok(());
    }

    Err(CgError::Install(format!(
        "{} does not contain {}",
        archive_path.display(),
        wanted
    )))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
