use thiserror::Error;

#[derive(Error, Debug)]
pub enum CgError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to persist temp file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Invalid HTTP status {status} from {url}")]
    InvalidStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Server reported {url} as not modified, but no cached copy exists")]
    CacheMissing { url: String },

    #[error("Cached copy of {url} is corrupt: {reason}")]
    CacheCorrupt { url: String, reason: String },

    #[error("Couldn't access git tags from 'github.com/{owner}/{project}': {source}")]
    TagListUnreachable {
        owner: String,
        project: String,
        #[source]
        source: Box<CgError>,
    },

    #[error("No tags found for 'github.com/{owner}/{project}'")]
    NoTags { owner: String, project: String },

    #[error("Tag not found for version {version}")]
    TagNotFound {
        version: String,
        available: Vec<String>,
    },

    #[error("Invalid schema file: missing version field")]
    InvalidSchema,

    #[error("{url} doesn't return JSON")]
    NotJson { url: String },

    #[error("Install failed: {0}")]
    Install(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CgError>;
