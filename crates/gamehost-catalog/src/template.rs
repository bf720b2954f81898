//! Game templates: immutable definitions a session is instantiated from.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Setup script used when a template file does not name one.
pub const DEFAULT_SETUP_SCRIPT: &str = "base-game.setup";

/// A game type as defined in the catalog.
///
/// Never mutated at runtime. A session copies these fields when it is
/// created, so a later reload does not change sessions already open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTemplate {
    /// File stem of the template file, e.g. `colorfall`.
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Short alias accepted wherever the name is.
    pub shorthand: String,
    /// Sort key for menus, lowest first.
    pub priority: i32,
    pub setup_script: String,
    pub min_players: usize,
    /// Whether the game cooperates with the join protocol instead of
    /// being started cold.
    pub connect_aware: bool,
}

/// On-disk shape of a template file. Everything is optional.
#[derive(Debug, Default, Deserialize)]
struct TemplateFile {
    display_name: Option<String>,
    description: Option<String>,
    shorthand: Option<String>,
    priority: Option<i32>,
    setup_script: Option<String>,
    min_players: Option<usize>,
    connect_aware: Option<bool>,
}

impl GameTemplate {
    /// Builds a template called `name` with every field defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self::from_file(name.into(), TemplateFile::default())
    }

    fn from_file(name: String, file: TemplateFile) -> Self {
        let display_name = file.display_name.unwrap_or_else(|| name.clone());
        let description = file.description.unwrap_or_else(|| display_name.clone());
        let shorthand = file
            .shorthand
            .unwrap_or_else(|| name.chars().take(2).collect());
        Self {
            display_name,
            description,
            shorthand,
            priority: file.priority.unwrap_or(0),
            setup_script: file
                .setup_script
                .unwrap_or_else(|| DEFAULT_SETUP_SCRIPT.to_string()),
            min_players: file.min_players.unwrap_or(1),
            connect_aware: file.connect_aware.unwrap_or(false),
            name,
        }
    }

    /// Parses one template from its file contents.
    pub fn parse(name: &str, json: &str) -> Result<Self, serde_json::Error> {
        let file: TemplateFile = serde_json::from_str(json)?;
        Ok(Self::from_file(name.to_string(), file))
    }

    /// Returns `true` if `token` is this template's name or shorthand.
    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.shorthand == token
    }
}

/// Loads every `*.game` file in `dir`, sorted by priority.
///
/// A missing directory yields an empty list. Files that cannot be read or
/// parsed are skipped with a warning.
pub fn load_templates(dir: &Path) -> Result<Vec<GameTemplate>, CatalogError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(CatalogError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut templates = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("game") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match read_template(&path, name) {
            Ok(template) => templates.push(template),
            Err(e) => tracing::warn!(error = %e, "skipping game template"),
        }
    }
    // Stable sort keeps directory order among equal priorities.
    templates.sort_by_key(|t| t.priority);
    Ok(templates)
}

fn read_template(path: &Path, name: &str) -> Result<GameTemplate, CatalogError> {
    let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    GameTemplate::parse(name, &json).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}
