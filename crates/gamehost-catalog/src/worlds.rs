//! Maps and play modes, read from the worlds YAML file.
//!
//! ```yaml
//! colorfall:
//!   maps:
//!     arena:
//!       MapID: arena
//!       MapPath: /srv/maps/colorfall/arena
//!       DisplayName: The Arena
//!       Authors: [alice, bob]
//!       Description: A round arena.
//!   modes:
//!     classic:
//!       ModeID: classic
//!       DisplayName: Classic
//! ```
//!
//! The section keys (`arena`, `classic`) are only labels; lookups use
//! `MapID` and `ModeID`. File order is preserved.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::CatalogError;

/// One playable map of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldInfo {
    pub game_name: String,
    pub map_id: String,
    pub map_path: String,
    pub display_name: String,
    pub authors: Vec<String>,
    pub description: String,
}

/// One play mode of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayMode {
    pub game_name: String,
    pub mode_id: String,
    pub display_name: String,
    pub description: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawWorld {
    #[serde(rename = "MapID")]
    map_id: Option<String>,
    map_path: Option<String>,
    display_name: Option<String>,
    authors: Option<Vec<String>>,
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMode {
    #[serde(rename = "ModeID")]
    mode_id: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
}

/// Everything the worlds file defines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldsFile {
    pub worlds: Vec<WorldInfo>,
    pub modes: Vec<PlayMode>,
}

impl WorldsFile {
    /// Parses the worlds document.
    ///
    /// Only a document that is not a mapping at all is an error. Game
    /// sections without `maps`, and entries missing their id or path, are
    /// skipped.
    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let mut out = Self::default();
        if yaml.trim().is_empty() {
            return Ok(out);
        }
        let root: Option<Mapping> = serde_yaml::from_str(yaml)?;
        for (game_key, section) in root.iter().flatten() {
            let Some(game_name) = game_key.as_str() else {
                continue;
            };
            for entry in entries(section, "maps") {
                match serde_yaml::from_value::<RawWorld>(entry.clone()) {
                    Ok(raw) => out.worlds.extend(world_from_raw(game_name, raw)),
                    Err(e) => tracing::warn!(game = game_name, error = %e, "skipping map entry"),
                }
            }
            for entry in entries(section, "modes") {
                match serde_yaml::from_value::<RawMode>(entry.clone()) {
                    Ok(raw) => out.modes.extend(mode_from_raw(game_name, raw)),
                    Err(e) => tracing::warn!(game = game_name, error = %e, "skipping mode entry"),
                }
            }
        }
        Ok(out)
    }

    /// Reads and parses the worlds file. A missing file is empty.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let yaml = match fs::read_to_string(path) {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&yaml).map_err(|source| CatalogError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn entries<'a>(section: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    section
        .get(key)
        .and_then(Value::as_mapping)
        .into_iter()
        .flat_map(|m| m.values())
}

fn world_from_raw(game_name: &str, raw: RawWorld) -> Option<WorldInfo> {
    let map_id = raw.map_id?;
    let map_path = raw.map_path?;
    Some(WorldInfo {
        game_name: game_name.to_string(),
        display_name: raw.display_name.unwrap_or_else(|| map_id.clone()),
        authors: raw.authors.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        map_id,
        map_path,
    })
}

fn mode_from_raw(game_name: &str, raw: RawMode) -> Option<PlayMode> {
    let mode_id = raw.mode_id?;
    Some(PlayMode {
        game_name: game_name.to_string(),
        display_name: raw.display_name.unwrap_or_else(|| mode_id.clone()),
        description: raw.description.unwrap_or_default(),
        mode_id,
    })
}
