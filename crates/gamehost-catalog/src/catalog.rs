//! Lazily populated, explicitly invalidated catalog lookups.

use std::path::PathBuf;

use gamehost_protocol::PlayerId;

use crate::{GameTemplate, NameCache, PlayMode, WorldInfo, WorldsFile, load_templates};

/// Where the catalog reads its files from.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    /// Directory holding `*.game` template files.
    pub games_dir: PathBuf,
    /// YAML file with maps and play modes.
    pub worlds_file: PathBuf,
    /// JSON object of player id to name.
    pub names_file: PathBuf,
}

impl Default for CatalogPaths {
    fn default() -> Self {
        Self {
            games_dir: PathBuf::from("games"),
            worlds_file: PathBuf::from("config/worlds.yml"),
            names_file: PathBuf::from("config/players.json"),
        }
    }
}

/// Read-only lookup service over templates, worlds, modes and names.
///
/// Each cache is filled on first use. A load failure is logged and the
/// cache is filled with an empty value, so a broken file does not cause a
/// reload attempt on every query; [`invalidate`](Self::invalidate) is the
/// only way to retry.
#[derive(Debug)]
pub struct GameCatalog {
    paths: CatalogPaths,
    templates: Option<Vec<GameTemplate>>,
    worlds: Option<WorldsFile>,
    names: Option<NameCache>,
}

impl GameCatalog {
    pub fn new(paths: CatalogPaths) -> Self {
        Self {
            paths,
            templates: None,
            worlds: None,
            names: None,
        }
    }

    /// Builds a catalog whose caches are already populated.
    ///
    /// Nothing is read from disk until [`invalidate`](Self::invalidate)
    /// is called.
    pub fn from_parts(templates: Vec<GameTemplate>, worlds: WorldsFile, names: NameCache) -> Self {
        let mut templates = templates;
        templates.sort_by_key(|t| t.priority);
        Self {
            paths: CatalogPaths::default(),
            templates: Some(templates),
            worlds: Some(worlds),
            names: Some(names),
        }
    }

    pub fn paths(&self) -> &CatalogPaths {
        &self.paths
    }

    /// Drops every cache. The next query reloads from disk.
    pub fn invalidate(&mut self) {
        tracing::info!("catalog caches invalidated");
        self.templates = None;
        self.worlds = None;
        self.names = None;
    }

    /// All templates, sorted by priority.
    pub fn templates(&mut self) -> &[GameTemplate] {
        let paths = &self.paths;
        self.templates.get_or_insert_with(|| {
            match load_templates(&paths.games_dir) {
                Ok(templates) => {
                    tracing::info!(count = templates.len(), "loaded game templates");
                    templates
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not load game templates");
                    Vec::new()
                }
            }
        })
    }

    /// Finds a template by name or shorthand.
    pub fn find_template(&mut self, token: &str) -> Option<GameTemplate> {
        self.templates().iter().find(|t| t.matches(token)).cloned()
    }

    fn worlds_file(&mut self) -> &WorldsFile {
        let paths = &self.paths;
        self.worlds.get_or_insert_with(|| match WorldsFile::load(&paths.worlds_file) {
            Ok(file) => {
                tracing::info!(
                    worlds = file.worlds.len(),
                    modes = file.modes.len(),
                    "loaded worlds catalog"
                );
                file
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load worlds catalog");
                WorldsFile::default()
            }
        })
    }

    /// Every map of every game.
    pub fn worlds(&mut self) -> &[WorldInfo] {
        &self.worlds_file().worlds
    }

    /// Maps of one game, in file order.
    pub fn worlds_for(&mut self, game: &str) -> Vec<WorldInfo> {
        self.worlds()
            .iter()
            .filter(|w| w.game_name == game)
            .cloned()
            .collect()
    }

    pub fn find_world(&mut self, game: &str, map_id: &str) -> Option<WorldInfo> {
        self.worlds()
            .iter()
            .find(|w| w.game_name == game && w.map_id == map_id)
            .cloned()
    }

    /// Play modes of one game, in file order.
    pub fn modes_for(&mut self, game: &str) -> Vec<PlayMode> {
        self.worlds_file()
            .modes
            .iter()
            .filter(|m| m.game_name == game)
            .cloned()
            .collect()
    }

    pub fn find_mode(&mut self, game: &str, mode_id: &str) -> Option<PlayMode> {
        self.worlds_file()
            .modes
            .iter()
            .find(|m| m.game_name == game && m.mode_id == mode_id)
            .cloned()
    }

    /// The cached name of a player, if the name cache knows it.
    pub fn player_name(&mut self, id: &PlayerId) -> Option<String> {
        let paths = &self.paths;
        let names = self
            .names
            .get_or_insert_with(|| match NameCache::load(&paths.names_file) {
                Ok(names) => names,
                Err(e) => {
                    tracing::warn!(error = %e, "could not load player names");
                    NameCache::default()
                }
            });
        names.get(id).map(str::to_string)
    }
}
