//! Player-name cache: a JSON object mapping player ids to names.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use gamehost_protocol::PlayerId;

use crate::CatalogError;

/// Shown when no name is known for a player.
pub const UNKNOWN_NAME: &str = "N/A";

/// Last known names of players, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct NameCache {
    names: HashMap<PlayerId, String>,
}

impl NameCache {
    /// Reads the cache file. A missing file is an empty cache; keys that
    /// are not valid ids are skipped.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let raw: HashMap<String, String> =
            serde_json::from_str(&json).map_err(|source| CatalogError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let mut names = HashMap::with_capacity(raw.len());
        for (key, name) in raw {
            match key.parse::<PlayerId>() {
                Ok(id) => {
                    names.insert(id, name);
                }
                Err(e) => tracing::warn!(%key, error = %e, "skipping name cache entry"),
            }
        }
        Ok(Self { names })
    }

    pub fn insert(&mut self, id: PlayerId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn get(&self, id: &PlayerId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
