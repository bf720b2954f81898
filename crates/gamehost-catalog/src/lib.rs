//! Static catalog content for gamehost.
//!
//! Three kinds of read-only data live here:
//!
//! - [`GameTemplate`]s, one JSON file per game type in the games directory
//! - [`WorldInfo`] maps and [`PlayMode`]s, from a single YAML file
//! - a player-name cache mapping ids to the last known name
//!
//! [`GameCatalog`] loads each of them lazily on first query and keeps the
//! result until [`GameCatalog::invalidate`] drops everything. The catalog
//! is owned by the event loop, so queries take `&mut self` and no locking
//! is involved.

mod catalog;
mod error;
mod names;
mod template;
mod worlds;

pub use catalog::{CatalogPaths, GameCatalog};
pub use error::CatalogError;
pub use names::{NameCache, UNKNOWN_NAME};
pub use template::{DEFAULT_SETUP_SCRIPT, GameTemplate, load_templates};
pub use worlds::{PlayMode, WorldInfo, WorldsFile};
