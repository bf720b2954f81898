//! Shared fixtures: a daemon on a temp dir, a memory transport, and a
//! scripted process runner.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use gamehost::{Daemon, DaemonBuilder, DaemonConfig, DaemonHandle, Engine, ProcessError, ProcessRunner};
use gamehost_catalog::{GameCatalog, GameTemplate, NameCache, WorldsFile};
use gamehost_protocol::{
    PlayerId, PlayerMessage, SendPlayerServer, SessionId, WorkerInstruction, channel,
};
use gamehost_store::WorkerState;
use gamehost_transport::{MemoryTransport, OnlinePlayer};
use serde_json::Value;
use tempfile::TempDir;
use uuid::Uuid;

pub const LOBBY: &str = "lobby";

pub const WORLDS: &str = "\
colorfall:
  maps:
    a:
      MapID: arena
      MapPath: /maps/arena
      DisplayName: The Arena
      Authors: [alice]
  modes:
    c:
      ModeID: classic
      DisplayName: Classic
";

// =========================================================================
// Fake process runner
// =========================================================================

#[derive(Debug, Default)]
pub struct RunnerState {
    pub fail_setup: bool,
    pub fail_start: bool,
    /// Workers whose liveness probe reports "gone".
    pub dead: HashSet<usize>,
    /// Every call, rendered as a command line.
    pub calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeRunner {
    state: Mutex<RunnerState>,
}

impl FakeRunner {
    pub fn state(&self) -> MutexGuard<'_, RunnerState> {
        self.state.lock().unwrap()
    }
}

impl ProcessRunner for FakeRunner {
    async fn setup(
        &self,
        script: &str,
        game: &str,
        worker: usize,
        map_path: &str,
    ) -> Result<(), ProcessError> {
        let mut state = self.state();
        state
            .calls
            .push(format!("{script} {game} {worker} {map_path}"));
        if state.fail_setup {
            return Err(ProcessError::NonZeroExit {
                stage: "setup",
                code: Some(1),
            });
        }
        Ok(())
    }

    async fn start(&self, worker: usize, port: u16) -> Result<(), ProcessError> {
        let mut state = self.state();
        state.calls.push(format!("game.start {worker} {port}"));
        if state.fail_start {
            return Err(ProcessError::NonZeroExit {
                stage: "start",
                code: Some(2),
            });
        }
        Ok(())
    }

    async fn is_alive(&self, worker: usize) -> bool {
        !self.state().dead.contains(&worker)
    }

    fn exec(&self, program: &str, args: &[String]) -> Result<(), ProcessError> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.state().calls.push(format!("exec {line}"));
        Ok(())
    }
}

// =========================================================================
// Harness
// =========================================================================

pub type TestDaemon = Daemon<MemoryTransport, FakeRunner>;
pub type TestEngine = Engine<MemoryTransport, FakeRunner>;

pub fn config(dir: &Path) -> DaemonConfig {
    DaemonConfig {
        worker_count: 2,
        save_dir: dir.join("save"),
        games_dir: dir.join("games"),
        worlds_file: dir.join("worlds.yml"),
        names_file: dir.join("players.json"),
        script_dir: dir.join("script"),
        run_dir: dir.join("run"),
        poll_interval: Duration::from_millis(10),
        sleep_duration: Duration::from_millis(10),
        ..DaemonConfig::default()
    }
}

/// `colorfall` (one player, one map, one mode) and `teams` (two players,
/// no maps).
pub fn catalog() -> GameCatalog {
    let mut colorfall = GameTemplate::named("colorfall");
    colorfall.display_name = "Colorfall".to_string();
    colorfall.shorthand = "cf".to_string();
    let mut teams = GameTemplate::named("teams");
    teams.min_players = 2;
    teams.priority = 1;
    GameCatalog::from_parts(
        vec![colorfall, teams],
        WorldsFile::parse(WORLDS).unwrap(),
        NameCache::default(),
    )
}

pub struct Harness {
    pub daemon: TestDaemon,
    pub handle: DaemonHandle<MemoryTransport, FakeRunner>,
    pub transport: Arc<MemoryTransport>,
    pub runner: Arc<FakeRunner>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::in_dir(tempfile::tempdir().unwrap())
    }

    fn in_dir(dir: TempDir) -> Self {
        let transport = Arc::new(MemoryTransport::new());
        transport.connect_endpoint(LOBBY);
        let runner = Arc::new(FakeRunner::default());
        let daemon = DaemonBuilder::new()
            .config(config(dir.path()))
            .catalog(catalog())
            .seed(7)
            .build(Arc::clone(&transport), Arc::clone(&runner));
        let handle = daemon.handle();
        Self {
            daemon,
            handle,
            transport,
            runner,
            dir,
        }
    }

    /// Drops the daemon and builds a fresh one over the same save files.
    pub fn restart(self) -> Self {
        let Self { daemon, dir, .. } = self;
        drop(daemon);
        Self::in_dir(dir)
    }

    pub fn engine(&self) -> &TestEngine {
        self.daemon.engine()
    }

    pub fn engine_mut(&mut self) -> &mut TestEngine {
        self.daemon.engine_mut()
    }

    /// Puts a player online in the lobby.
    pub fn player(&self, name: &str) -> OnlinePlayer {
        let player = OnlinePlayer {
            id: PlayerId(Uuid::new_v4()),
            name: name.to_string(),
            endpoint: LOBBY.to_string(),
        };
        self.transport.add_player(player.clone());
        player
    }

    /// Runs every queued task.
    pub async fn settle(&mut self) {
        while self.daemon.queued() > 0 {
            self.daemon.tick().await;
        }
    }

    /// Ticks until `done` holds, or gives up after a while.
    pub async fn wait_for(&mut self, mut done: impl FnMut(&TestEngine) -> bool) -> bool {
        for _ in 0..200 {
            if done(self.daemon.engine()) {
                return true;
            }
            self.daemon.tick().await;
        }
        done(self.daemon.engine())
    }

    /// Runs `/game <line>` as `player` through the handle.
    pub async fn game(&mut self, player: &OnlinePlayer, line: &str) {
        let mut args = vec!["game".to_string()];
        args.extend(line.split_whitespace().map(str::to_string));
        self.handle
            .handle_remote_command(player.clone(), &player.endpoint, &args)
            .unwrap();
        self.settle().await;
    }

    /// Delivers a control message from `from`.
    pub async fn inbound(&mut self, from: &str, message: Value) {
        let data = serde_json::to_vec(&message).unwrap();
        self.handle
            .handle_message(from, channel::MINIGAMES, &data)
            .unwrap();
        self.settle().await;
    }

    /// Creates a colorfall session owned by `owner` and returns its id.
    pub async fn create(&mut self, owner: &OnlinePlayer) -> SessionId {
        self.game(owner, "colorfall create").await;
        self.current_game(&owner.id).expect("session created")
    }

    /// Starts `owner`'s session and waits for the boot to settle.
    pub async fn start(&mut self, owner: &OnlinePlayer) {
        self.game(owner, "start").await;
        self.wait_for(|e| e.store().workers().iter().all(|w| w.state != WorkerState::Boot))
            .await;
    }

    pub fn current_game(&self, player: &PlayerId) -> Option<SessionId> {
        self.engine().store().current_game(player)
    }

    pub fn worker_state(&self, index: usize) -> WorkerState {
        self.engine().store().worker(index).unwrap().state
    }

    /// Plain text of every chat line sent to `player`.
    pub fn chat(&self, player: &PlayerId) -> Vec<String> {
        self.transport
            .frames_on(channel::PLAYER_MESSAGE)
            .iter()
            .filter_map(|f| serde_json::from_slice::<PlayerMessage>(&f.data).ok())
            .filter(|m| m.target == *player)
            .map(|m| plain_text(&m.chat))
            .collect()
    }

    pub fn saw(&self, player: &PlayerId, needle: &str) -> bool {
        self.chat(player).iter().any(|line| line.contains(needle))
    }

    pub fn moves(&self) -> Vec<SendPlayerServer> {
        self.transport
            .frames_on(channel::SEND_PLAYER_SERVER)
            .iter()
            .map(|f| serde_json::from_slice(&f.data).unwrap())
            .collect()
    }

    /// Asserts the cross-record invariants that must hold between ticks:
    /// every user's current game lists them, no session has two hosts,
    /// and an OFF worker hosts nothing.
    pub fn assert_consistent(&self) {
        let store = self.engine().store();
        for user in store.users() {
            if let Some(game) = user.current_game {
                let session = store
                    .session(&game)
                    .unwrap_or_else(|| panic!("{} points at missing session {game}", user.id));
                assert!(session.is_member(&user.id), "{} not listed by {game}", user.id);
            }
        }
        let mut hosted = HashSet::new();
        for worker in store.workers() {
            if worker.state == WorkerState::Off {
                assert_eq!(worker.current_game, None, "OFF worker {} hosts a session", worker.index);
            }
            if let Some(game) = worker.current_game {
                assert!(hosted.insert(game), "session {game} has two workers");
            }
        }
    }

    /// Instructions delivered to worker endpoint `endpoint`.
    pub fn worker_frames(&self, endpoint: &str) -> Vec<WorkerInstruction> {
        self.transport
            .frames_on(channel::MINIGAMES)
            .iter()
            .filter(|f| f.endpoint.as_deref() == Some(endpoint))
            .map(|f| serde_json::from_slice(&f.data).unwrap())
            .collect()
    }
}

fn plain_text(chat: &Value) -> String {
    match chat {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::Array(items) => items.iter().map(plain_text).collect(),
        _ => String::new(),
    }
}
