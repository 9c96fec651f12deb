// Tool install glue and release installer

mod test_helpers;

use cgkit::CgError;
use cgkit::events::{EventsGenerator, REPOSITORY_URL, TOOL};
use cgkit::installer::{InstallRequest, Installer, ReleaseInstaller, executable_name, platform_tag};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use test_helpers::TestEnvironment;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Records install requests instead of downloading anything
#[derive(Default, Clone)]
struct RecordingInstaller {
    calls: Arc<Mutex<Vec<(String, String, String, PathBuf)>>>,
}

impl Installer for RecordingInstaller {
    async fn install(&self, request: &InstallRequest<'_>) -> cgkit::Result<String> {
        self.calls.lock().unwrap().push((
            request.tool.to_string(),
            request.repository_url.to_string(),
            request.version.to_string(),
            request.install_dir.to_path_buf(),
        ));
        Ok(format!("{}-{}", request.tool, request.version))
    }
}

fn tool_archive(tool: &str, contents: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    let name = format!("{}{}", tool, std::env::consts::EXE_SUFFIX);
    builder.append_data(&mut header, name, contents).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

#[tokio::test]
async fn test_ensure_installed_resolves_tag_and_strips_prefix() {
    let env = TestEnvironment::new().await;
    env.mount_tags("code-game-project", TOOL, &["v0.5.0", "v0.4.2", "v0.4.1"])
        .await;

    let installer = RecordingInstaller::default();
    let bin_dir = env.paths.bin_dir.join(TOOL);
    let generator = EventsGenerator::with_installer(env.resolver(), installer.clone(), bin_dir.clone());

    let exe = generator.ensure_installed("0.4").await.unwrap();
    assert_eq!(exe, "cg-gen-events-0.4.2");

    let calls = installer.calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![(
            TOOL.to_string(),
            REPOSITORY_URL.to_string(),
            "0.4.2".to_string(),
            bin_dir
        )]
    );
}

#[tokio::test]
async fn test_ensure_installed_propagates_tag_not_found() {
    let env = TestEnvironment::new().await;
    env.mount_tags("code-game-project", TOOL, &["v0.5.0"]).await;

    let installer = RecordingInstaller::default();
    let generator =
        EventsGenerator::with_installer(env.resolver(), installer.clone(), env.paths.bin_dir.clone());

    let result = generator.ensure_installed("0.3").await;
    assert!(matches!(result, Err(CgError::TagNotFound { .. })));
    assert!(installer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_latest_version() {
    let env = TestEnvironment::new().await;
    env.mount_tags("code-game-project", TOOL, &["v0.5.3", "v0.5.2"]).await;

    let generator = EventsGenerator::with_installer(
        env.resolver(),
        RecordingInstaller::default(),
        env.paths.bin_dir.clone(),
    );
    assert_eq!(generator.latest_version().await.unwrap(), "0.5");
}

#[tokio::test]
async fn test_latest_version_error_is_wrapped() {
    let env = TestEnvironment::new().await;
    env.mount_tags("code-game-project", TOOL, &[]).await;

    let generator = EventsGenerator::with_installer(
        env.resolver(),
        RecordingInstaller::default(),
        env.paths.bin_dir.clone(),
    );
    let error = generator.latest_version().await.unwrap_err();
    assert!(error.to_string().contains("Couldn't determine the latest CGE version"));
    assert!(matches!(
        error.downcast_ref::<CgError>(),
        Some(CgError::NoTags { .. })
    ));
}

#[tokio::test]
async fn test_release_installer_downloads_once() {
    let env = TestEnvironment::new().await;
    let asset = format!("/releases/download/v1.2.0/tool-{}.tar.gz", platform_tag());

    Mock::given(method("GET"))
        .and(path(asset))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(tool_archive("tool", b"binary")))
        .expect(1)
        .mount(&env.server)
        .await;

    let install_dir = env.paths.bin_dir.join("tool");
    let repository_url = env.server.uri();
    let request = InstallRequest {
        tool: "tool",
        repository_url: &repository_url,
        version: "1.2.0",
        install_dir: &install_dir,
    };
    let installer = ReleaseInstaller::with_client(reqwest::Client::new());

    let exe = installer.install(&request).await.unwrap();
    assert_eq!(exe, executable_name("tool", "1.2.0"));
    assert_eq!(std::fs::read(install_dir.join(&exe)).unwrap(), b"binary");

    // already present: no second download
    let again = installer.install(&request).await.unwrap();
    assert_eq!(again, exe);
}

#[tokio::test]
async fn test_release_installer_missing_release() {
    let env = TestEnvironment::new().await;
    let install_dir = env.paths.bin_dir.join("tool");
    let repository_url = env.server.uri();
    let request = InstallRequest {
        tool: "tool",
        repository_url: &repository_url,
        version: "9.9.9",
        install_dir: &install_dir,
    };

    let result = ReleaseInstaller::with_client(reqwest::Client::new())
        .install(&request)
        .await;
    assert!(matches!(result, Err(CgError::InvalidStatus { .. })));
    assert!(!install_dir.join(executable_name("tool", "9.9.9")).exists());
}
