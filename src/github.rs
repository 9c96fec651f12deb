//! Tag based version resolution for GitHub hosted projects.
//!
//! All requests go through the [`ConditionalCache`], so repeated lookups of
//! the same tag list cost a `304` round trip instead of a full download and
//! don't count against the API rate limit.
//!
//! The tag API lists tags newest first; lookups rely on that order and never
//! re-sort.

use crate::cache::ConditionalCache;
use crate::compat::{self, LATEST};
use crate::error::{CgError, Result};
use crate::paths::Paths;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One entry of `GET /repos/{owner}/{project}/tags`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TagResolver {
    cache: ConditionalCache,
    api_base: String,
    raw_base: String,
}

impl TagResolver {
    pub fn new(paths: &Paths) -> Result<Self> {
        Ok(Self::with_cache(ConditionalCache::new(paths)?, paths))
    }

    pub fn with_cache(cache: ConditionalCache, paths: &Paths) -> Self {
        Self {
            cache,
            api_base: paths.api_base.clone(),
            raw_base: paths.raw_base.clone(),
        }
    }

    /// Tags of `owner/project`, newest first.
    pub async fn tags(&self, owner: &str, project: &str) -> Result<Vec<Tag>> {
        let url = format!("{}/repos/{}/{}/tags", self.api_base, owner, project);
        self.cache
            .fetch::<Vec<Tag>>(&url)
            .await
            .map_err(|e| CgError::TagListUnreachable {
                owner: owner.to_string(),
                project: project.to_string(),
                source: Box::new(e),
            })
    }

    /// Name of the newest tag.
    ///
    /// # Errors
    ///
    /// [`CgError::TagListUnreachable`] if the list can't be fetched,
    /// [`CgError::NoTags`] if the project has no tags.
    pub async fn latest_tag(&self, owner: &str, project: &str) -> Result<String> {
        let tags = self.tags(owner, project).await?;
        tags.into_iter()
            .next()
            .map(|tag| tag.name)
            .ok_or_else(|| CgError::NoTags {
                owner: owner.to_string(),
                project: project.to_string(),
            })
    }

    /// First tag (in API order) whose name starts with `v{version}`.
    ///
    /// Asking for `2.3` with tags `v2.3.1, v2.3.0, v2.2.0` yields `v2.3.1`.
    /// The comparison is a plain string prefix, so `1` also matches `v10.0.0`.
    pub async fn tag_for_version(&self, owner: &str, project: &str, version: &str) -> Result<String> {
        let tags = self.tags(owner, project).await?;
        let prefix = format!("v{}", version);

        if let Some(tag) = tags.iter().find(|tag| tag.name.starts_with(&prefix)) {
            debug!(owner, project, version, tag = %tag.name, "resolved tag");
            return Ok(tag.name.clone());
        }

        Err(CgError::TagNotFound {
            version: version.to_string(),
            available: tags.into_iter().map(|tag| tag.name).collect(),
        })
    }

    /// The project's `versions.json`, from `main` or else `master`.
    pub async fn load_versions_json(&self, owner: &str, project: &str) -> Result<serde_json::Value> {
        let main = format!("{}/{}/{}/main/versions.json", self.raw_base, owner, project);
        match self.cache.fetch(&main).await {
            Ok(value) => Ok(value),
            Err(e) => {
                debug!(owner, project, error = %e, "versions.json not on main, trying master");
                let master = format!("{}/{}/{}/master/versions.json", self.raw_base, owner, project);
                self.cache.fetch(&master).await
            }
        }
    }

    /// Library version of `owner/project` that speaks `cg_version`.
    ///
    /// Never fails: an unreachable or malformed `versions.json` logs a warning
    /// and yields `"latest"`.
    pub async fn library_version_for(&self, owner: &str, project: &str, cg_version: &str) -> String {
        let raw = match self.load_versions_json(owner, project).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Couldn't fetch versions.json. Using latest client library version.");
                return LATEST.to_string();
            }
        };

        match serde_json::from_value::<HashMap<String, String>>(raw) {
            Ok(versions) => compat::compatible_version(&versions, cg_version),
            Err(e) => {
                warn!(error = %e, "Invalid versions.json. Using latest client library version.");
                LATEST.to_string()
            }
        }
    }
}

/// `major.minor` of a tag name: `v0.4.2` becomes `0.4`.
pub fn resolved_version(tag: &str) -> String {
    let tag = tag.strip_prefix('v').unwrap_or(tag);
    tag.split('.').take(2).collect::<Vec<_>>().join(".")
}
