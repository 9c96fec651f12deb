//! Library interface for cgkit
//!
//! Resolves CodeGame tool versions from GitHub tags through an ETag
//! revalidated cache, installs matching `cg-gen-events` releases and reads the
//! declared version out of event schema files.

pub mod cache;
pub mod compat;
pub mod config;
pub mod error;
pub mod events;
pub mod github;
pub mod installer;
pub mod paths;
pub mod schema;
pub mod server;
pub mod sessions;
pub mod ui;

// Re-export commonly used items
pub use cache::{CacheEntry, ConditionalCache};
pub use error::{CgError, Result};
pub use github::{Tag, TagResolver, resolved_version};
pub use paths::Paths;
pub use schema::extract_version;
