// Test helpers for isolated testing
// Every environment gets its own temp directories and mock HTTP server

#![allow(dead_code)]

use cgkit::cache::ConditionalCache;
use cgkit::{Paths, TagResolver};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Isolated test environment using temporary directories
/// Automatically cleaned up when dropped (RAII pattern)
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub paths: Paths,
    pub server: MockServer,
}

impl TestEnvironment {
    /// Temp directories for cache/data/config plus a mock server that
    /// stands in for both the tag API and the raw file host.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let server = MockServer::start().await;
        let paths = Paths::under(temp_dir.path()).with_remote(&server.uri());

        Self {
            temp_dir,
            paths,
            server,
        }
    }

    pub fn cache(&self) -> ConditionalCache {
        ConditionalCache::new(&self.paths).expect("Failed to build cache")
    }

    pub fn resolver(&self) -> TagResolver {
        TagResolver::new(&self.paths).expect("Failed to build resolver")
    }

    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.server.uri(), route)
    }

    /// Serve `names` as the tag list of `owner/project`.
    pub async fn mount_tags(&self, owner: &str, project: &str, names: &[&str]) {
        let body: Vec<_> = names.iter().map(|name| json!({ "name": name })).collect();
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/{}/tags", owner, project)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }
}
