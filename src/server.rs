//! Client for a game server's REST API.

use crate::cache::api_client;
use crate::error::{CgError, Result};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// `GET /info`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub name: String,
    pub cg_version: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub repository_url: String,
}

#[derive(Debug, Deserialize)]
struct PlayersResponse {
    #[serde(default)]
    players: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct GameServer {
    base_url: String,
    client: reqwest::Client,
}

impl GameServer {
    /// Connect to the server at `url` (with or without scheme).
    ///
    /// Servers that expose their API under `/api` are detected by probing
    /// `/api/info`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = api_client()?;
        let host = trim_url(url);
        let tls = match scheme_tls(url) {
            Some(tls) => tls,
            None => client.get(format!("https://{}", host)).send().await.is_ok(),
        };
        let mut base_url = format!("{}://{}", if tls { "https" } else { "http" }, host);

        let probe = client.get(format!("{}/api/info", base_url)).send().await?;
        if probe.status() == StatusCode::OK && is_json(&probe) {
            base_url.push_str("/api");
        }
        debug!(%base_url, "connected to game server");

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn info(&self) -> Result<GameInfo> {
        let url = format!("{}/info", self.base_url);
        let info: GameInfo = self.get_json(&url).await?;
        if info.name.is_empty() || info.cg_version.is_empty() {
            return Err(CgError::Other(anyhow::anyhow!(
                "{} is missing the game name or CG version",
                url
            )));
        }
        Ok(info)
    }

    /// Player ids mapped to usernames.
    pub async fn players(&self, game_id: &str) -> Result<HashMap<String, String>> {
        let url = format!("{}/games/{}/players", self.base_url, game_id);
        let response: PlayersResponse = self.get_json(&url).await?;
        Ok(response.players)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(CgError::InvalidStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }
        if !is_json(&response) {
            return Err(CgError::NotJson {
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| CgError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Host and path without scheme or trailing slash.
pub fn trim_url(url: &str) -> &str {
    let url = url.trim();
    let url = ["https://", "http://", "wss://", "ws://"]
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))
        .unwrap_or(url);
    url.trim_end_matches('/')
}

fn scheme_tls(url: &str) -> Option<bool> {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("wss://") {
        Some(true)
    } else if url.starts_with("http://") || url.starts_with("ws://") {
        Some(false)
    } else {
        None
    }
}

fn is_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("application/json"))
}
