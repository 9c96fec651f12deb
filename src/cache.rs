//! Conditional HTTP fetch cache keyed by request URL.
//!
//! Each URL gets exactly one file in the cache directory, named by
//! percent-escaping the URL. The file holds the response validator (ETag) on
//! the first line and the decoded payload, re-serialized as compact JSON, on
//! the second:
//!
//! ```text
//! ~/.cache/codegame/github_requests/
//!   https%3A%2F%2Fapi.github.com%2Frepos%2Fcode-game-project%2Fcg-gen-events%2Ftags
//!     W/"5f2c..."
//!     [{"name":"v0.4.1"},{"name":"v0.4.0"}]
//! ```
//!
//! [`ConditionalCache::fetch`] sends the stored validator as `If-None-Match`.
//! A `304 Not Modified` answer is served from the file, a `200` replaces it.
//! An entry that cannot be parsed is treated as absent, so the next request
//! is unconditional and overwrites it.
//!
//! # Examples
//!
//! ```no_run
//! use cgkit::cache::ConditionalCache;
//! use cgkit::paths::Paths;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = ConditionalCache::new(&Paths::from_env())?;
//!     let map: serde_json::Value = cache
//!         .fetch("https://raw.githubusercontent.com/owner/project/main/versions.json")
//!         .await?;
//!     println!("{map}");
//!     Ok(())
//! }
//! ```

use crate::error::{CgError, Result};
use crate::paths::Paths;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::header::{ETAG, HeaderValue, IF_NONE_MATCH};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout for API-style requests.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything except RFC 3986 unreserved characters gets escaped.
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Build the HTTP client shared by the API-style collaborators.
pub fn api_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(API_TIMEOUT)
        .user_agent(format!("cgkit/{}", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// A stored response: validator token plus decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub validator: String,
    pub payload: T,
}

#[derive(Debug, Clone)]
pub struct ConditionalCache {
    client: reqwest::Client,
    dir: PathBuf,
}

impl ConditionalCache {
    /// Cache in `paths.cache_dir` using a client with the 10 second API timeout.
    pub fn new(paths: &Paths) -> Result<Self> {
        Ok(Self::with_client(api_client()?, paths.cache_dir.clone()))
    }

    /// Cache in `dir`, sending requests through `client` (and its timeout).
    pub fn with_client(client: reqwest::Client, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the entry for `url`.
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(escape_url(url))
    }

    /// GET `url` and decode the JSON body as `T`, revalidating any stored copy.
    ///
    /// # Errors
    ///
    /// - [`CgError::Http`] on transport failure (cache untouched)
    /// - [`CgError::Decode`] if a fresh body does not decode (cache untouched)
    /// - [`CgError::CacheMissing`] / [`CgError::CacheCorrupt`] if the server
    ///   answers `304` but no usable local copy exists
    /// - [`CgError::InvalidStatus`] for any other status
    pub async fn fetch<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned + Serialize,
    {
        let mut request = self.client.get(url);

        match self.read_entry::<T>(url) {
            Ok(Some(entry)) if !entry.validator.is_empty() => {
                match HeaderValue::from_str(&entry.validator) {
                    Ok(value) => {
                        debug!(url, validator = %entry.validator, "revalidating cached response");
                        request = request.header(IF_NONE_MATCH, value);
                    }
                    Err(_) => debug!(url, "stored validator is not a valid header value"),
                }
            }
            Ok(_) => {}
            Err(e) => debug!(url, error = %e, "ignoring unreadable cache entry"),
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            debug!(url, "not modified, serving cached copy");
            return match self.read_entry::<T>(url)? {
                Some(entry) => Ok(entry.payload),
                None => Err(CgError::CacheMissing {
                    url: url.to_string(),
                }),
            };
        }

        if !status.is_success() {
            return Err(CgError::InvalidStatus {
                url: url.to_string(),
                status,
            });
        }

        let validator = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes().await?;
        let payload: T = serde_json::from_slice(&body).map_err(|source| CgError::Decode {
            url: url.to_string(),
            source,
        })?;

        let entry = CacheEntry { validator, payload };
        if let Err(e) = self.write_entry(url, &entry) {
            warn!(url, error = %e, "failed to store response in cache");
        }

        Ok(entry.payload)
    }

    /// Read the stored entry for `url` without touching the network.
    ///
    /// Returns `Ok(None)` if there is no entry and [`CgError::CacheCorrupt`]
    /// if the file exists but does not hold a validator line and a payload
    /// that decodes as `T`.
    pub fn read_entry<T: DeserializeOwned>(&self, url: &str) -> Result<Option<CacheEntry<T>>> {
        let content = match fs::read_to_string(self.entry_path(url)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        parse_entry(url, &content).map(Some)
    }

    /// Replace the entry for `url`.
    ///
    /// The file is written next to its destination and renamed into place, so
    /// readers see either the old entry or the new one.
    pub fn write_entry<T: Serialize>(&self, url: &str, entry: &CacheEntry<T>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(url);

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)?;
        writeln!(temp, "{}", entry.validator)?;
        serde_json::to_writer(&mut temp, &entry.payload)?;
        writeln!(temp)?;
        temp.persist(&path)?;

        Ok(path)
    }

    /// Remove every cached response. Returns the number of files removed.
    pub fn clear(&self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

/// Storage file name for `url`.
pub fn escape_url(url: &str) -> String {
    utf8_percent_encode(url, FILE_NAME).to_string()
}

fn parse_entry<T: DeserializeOwned>(url: &str, content: &str) -> Result<CacheEntry<T>> {
    let corrupt = |reason: String| CgError::CacheCorrupt {
        url: url.to_string(),
        reason,
    };

    let mut lines = content.lines();
    let validator = lines
        .next()
        .ok_or_else(|| corrupt("missing validator line".to_string()))?;
    let payload_line = lines
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| corrupt("missing payload".to_string()))?;
    let payload = serde_json::from_str(payload_line).map_err(|e| corrupt(e.to_string()))?;

    Ok(CacheEntry {
        validator: validator.to_string(),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir) -> ConditionalCache {
        ConditionalCache::with_client(reqwest::Client::new(), dir.path().join("requests"))
    }

    #[test]
    fn test_escape_url() {
        assert_eq!(
            escape_url("https://api.github.com/repos/a/b/tags"),
            "https%3A%2F%2Fapi.github.com%2Frepos%2Fa%2Fb%2Ftags"
        );
        assert_eq!(escape_url("plain-name_1.0~x"), "plain-name_1.0~x");
    }

    #[test]
    fn test_entry_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let url = "https://example.com/tags";
        let entry = CacheEntry {
            validator: "W/\"abc123\"".to_string(),
            payload: json!([{"name": "v1.0.0"}, {"name": "v0.9.0"}]),
        };

        let path = cache.write_entry(url, &entry).unwrap();
        assert!(path.ends_with("https%3A%2F%2Fexample.com%2Ftags"));

        let read: CacheEntry<serde_json::Value> = cache.read_entry(url).unwrap().unwrap();
        assert_eq!(read, entry);
    }

    #[test]
    fn test_overwrite_replaces_whole_entry() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let url = "https://example.com/map";

        cache
            .write_entry(url, &CacheEntry { validator: "\"1\"".into(), payload: json!({"a": "1"}) })
            .unwrap();
        cache
            .write_entry(url, &CacheEntry { validator: "\"2\"".into(), payload: json!({"b": "2"}) })
            .unwrap();

        let read: CacheEntry<serde_json::Value> = cache.read_entry(url).unwrap().unwrap();
        assert_eq!(read.validator, "\"2\"");
        assert_eq!(read.payload, json!({"b": "2"}));
        // only the entry itself, no leftover temp files
        assert_eq!(fs::read_dir(cache.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_entry_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let read: Option<CacheEntry<serde_json::Value>> =
            cache.read_entry("https://example.com/none").unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn test_corrupt_entries() {
        for content in ["", "\"etag\"\n", "\"etag\"\n{not json\n"] {
            let result = parse_entry::<serde_json::Value>("https://example.com", content);
            assert!(
                matches!(result, Err(CgError::CacheCorrupt { .. })),
                "content {content:?} should be corrupt"
            );
        }
    }

    #[test]
    fn test_empty_validator_line_is_valid() {
        let entry = parse_entry::<Vec<u32>>("https://example.com", "\n[1,2,3]\n").unwrap();
        assert_eq!(entry.validator, "");
        assert_eq!(entry.payload, vec![1, 2, 3]);
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        assert_eq!(cache.clear().unwrap(), 0);

        for url in ["https://a.example/1", "https://a.example/2"] {
            cache
                .write_entry(url, &CacheEntry { validator: String::new(), payload: 1 })
                .unwrap();
        }
        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.read_entry::<u32>("https://a.example/1").unwrap().is_none());
    }
}
