//! Daemon configuration.

use std::path::PathBuf;
use std::time::Duration;

use gamehost_catalog::CatalogPaths;

/// Everything the daemon needs to know about its surroundings.
///
/// All paths are relative to the working directory unless absolute.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Size of the worker pool.
    pub worker_count: usize,
    /// Directory holding `users.save`, `servers.save` and `games.save`.
    pub save_dir: PathBuf,
    /// Directory of `*.game` template files.
    pub games_dir: PathBuf,
    /// Maps and play modes.
    pub worlds_file: PathBuf,
    /// Player id to name cache.
    pub names_file: PathBuf,
    /// Directory holding the setup, start and liveness scripts.
    pub script_dir: PathBuf,
    /// Each worker gets `<run_dir>/<prefix><index>/`.
    pub run_dir: PathBuf,
    /// Worker `i` listens on `base_port + i`.
    pub base_port: u16,
    /// Worker `i` is the transport endpoint `<prefix><i>`.
    pub endpoint_prefix: String,
    /// Longest the loop waits for a task; also the reconciliation cadence.
    pub poll_interval: Duration,
    /// How long the `sleep` console command pauses the loop.
    pub sleep_duration: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            save_dir: PathBuf::from("save"),
            games_dir: PathBuf::from("games"),
            worlds_file: PathBuf::from("config/worlds.yml"),
            names_file: PathBuf::from("config/players.json"),
            script_dir: PathBuf::from("script"),
            run_dir: PathBuf::from("run"),
            base_port: 2600,
            endpoint_prefix: "game".to_string(),
            poll_interval: Duration::from_secs(1),
            sleep_duration: Duration::from_secs(10),
        }
    }
}

impl DaemonConfig {
    /// Transport endpoint name of worker `index`.
    pub fn worker_endpoint(&self, index: usize) -> String {
        format!("{}{}", self.endpoint_prefix, index)
    }

    /// Inverse of [`worker_endpoint`](Self::worker_endpoint).
    pub fn worker_index(&self, endpoint: &str) -> Option<usize> {
        let index: usize = endpoint.strip_prefix(&self.endpoint_prefix)?.parse().ok()?;
        (index < self.worker_count).then_some(index)
    }

    pub fn worker_port(&self, index: usize) -> u16 {
        let offset = u16::try_from(index).unwrap_or(u16::MAX);
        self.base_port.saturating_add(offset)
    }

    /// Where worker `index` reads its session config from.
    pub fn session_config_path(&self, index: usize) -> PathBuf {
        self.run_dir
            .join(self.worker_endpoint(index))
            .join("game_config.json")
    }

    pub fn catalog_paths(&self) -> CatalogPaths {
        CatalogPaths {
            games_dir: self.games_dir.clone(),
            worlds_file: self.worlds_file.clone(),
            names_file: self.names_file.clone(),
        }
    }
}
