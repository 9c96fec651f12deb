//! Stored player sessions, one JSON file per game URL and username.
//!
//! ```text
//! ~/.local/share/codegame/games/
//!   games.example.com%2Fchess/
//!     alice.json    # {"game_id": ..., "player_id": ..., "player_secret": ...}
//! ```

use crate::error::{CgError, Result};
use crate::paths::Paths;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip)]
    pub game_url: String,
    #[serde(skip)]
    pub username: String,
    pub game_id: String,
    pub player_id: String,
    pub player_secret: String,
}

impl Session {
    pub fn new(
        game_url: impl Into<String>,
        username: impl Into<String>,
        game_id: impl Into<String>,
        player_id: impl Into<String>,
        player_secret: impl Into<String>,
    ) -> Self {
        Self {
            game_url: game_url.into(),
            username: username.into(),
            game_id: game_id.into(),
            player_id: player_id.into(),
            player_secret: player_secret.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(paths: &Paths) -> Self {
        Self::at(paths.sessions_dir())
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn game_dir(&self, game_url: &str) -> PathBuf {
        self.root.join(crate::cache::escape_url(game_url))
    }

    /// Every stored game URL mapped to its usernames.
    pub fn list_sessions(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut sessions = BTreeMap::new();
        for (game_url, dir) in self.game_dirs()? {
            sessions.insert(game_url, usernames_in(&dir)?);
        }
        Ok(sessions)
    }

    /// Every game URL with at least a directory in the store.
    pub fn list_games(&self) -> Result<Vec<String>> {
        Ok(self.game_dirs()?.into_iter().map(|(url, _)| url).collect())
    }

    pub fn list_usernames(&self, game_url: &str) -> Result<Vec<String>> {
        usernames_in(&self.game_dir(game_url))
    }

    pub fn load(&self, game_url: &str, username: &str) -> Result<Session> {
        let path = self.game_dir(game_url).join(format!("{}.json", username));
        let content = fs::read_to_string(&path)?;
        let mut session: Session = serde_json::from_str(&content)?;
        session.game_url = game_url.to_string();
        session.username = username.to_string();
        Ok(session)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if session.game_url.is_empty() {
            return Err(CgError::Session("empty game url".to_string()));
        }

        let dir = self.game_dir(&session.game_url);
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string(session)?;
        fs::write(dir.join(format!("{}.json", session.username)), json)?;
        Ok(())
    }

    /// Delete a session; its game directory goes too once it is empty.
    pub fn remove(&self, session: &Session) -> Result<()> {
        if session.game_url.is_empty() {
            return Ok(());
        }

        let dir = self.game_dir(&session.game_url);
        fs::remove_file(dir.join(format!("{}.json", session.username)))?;

        if fs::read_dir(&dir).is_ok_and(|mut entries| entries.next().is_none()) {
            let _ = fs::remove_dir(&dir);
        }
        Ok(())
    }

    fn game_dirs(&self) -> Result<Vec<(String, PathBuf)>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Ok(game_url) = percent_decode_str(&name).decode_utf8() {
                dirs.push((game_url.into_owned(), entry.path()));
            }
        }

        dirs.sort();
        Ok(dirs)
    }
}

fn usernames_in(dir: &Path) -> Result<Vec<String>> {
    let mut users = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(user) = name.strip_suffix(".json") {
            users.push(user.to_string());
        }
    }
    users.sort();
    Ok(users)
}
