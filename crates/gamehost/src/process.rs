//! External process orchestration: the boot sequence and liveness probe.
//!
//! Booting a session means running two scripts, with a config file
//! written between them:
//!
//! ```text
//! <setup_script> <game> <worker> <map path>   must exit 0
//! write <run>/game<worker>/game_config.json
//! game.start <worker> <port>                  must exit 0
//! ```
//!
//! The sequence runs in its own Tokio task so the event loop never waits
//! on it. Its only effect on the daemon's state is the single completion
//! task it submits at the end. A failed boot is final for that attempt;
//! nothing here retries.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use gamehost_protocol::{ChatColor, ChatMessage, SessionId};
use gamehost_store::{Selection, StoreError, WorkerSlot};
use gamehost_transport::Transport;
use rand::seq::IndexedRandom;
use tokio::process::Command;

use crate::Engine;

/// Errors from running external processes.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The program could not be started at all.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure.
    #[error("{stage} exited with {code:?}")]
    NonZeroExit {
        stage: &'static str,
        code: Option<i32>,
    },

    /// Writing the session config for the worker failed.
    #[error("failed to write {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the external side of the worker lifecycle.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one runner is shared by the event loop and
///   every boot task through an `Arc`.
///
/// The returned futures must be `Send` because boot sequences run in
/// spawned Tokio tasks.
pub trait ProcessRunner: Send + Sync + 'static {
    /// Prepares worker `worker` to host `game` on the map at `map_path`.
    fn setup(
        &self,
        script: &str,
        game: &str,
        worker: usize,
        map_path: &str,
    ) -> impl std::future::Future<Output = Result<(), ProcessError>> + Send;

    /// Launches the prepared worker, listening on `port`.
    fn start(
        &self,
        worker: usize,
        port: u16,
    ) -> impl std::future::Future<Output = Result<(), ProcessError>> + Send;

    /// Returns `true` if the session process of `worker` is still alive.
    fn is_alive(&self, worker: usize) -> impl std::future::Future<Output = bool> + Send;

    /// Starts an arbitrary command without waiting for it.
    fn exec(&self, program: &str, args: &[String]) -> Result<(), ProcessError>;
}

// ---------------------------------------------------------------------------
// ScriptRunner
// ---------------------------------------------------------------------------

/// [`ProcessRunner`] backed by the scripts in one directory:
/// the template's setup script, `game.start`, and `game.exists`.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    script_dir: PathBuf,
}

impl ScriptRunner {
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
        }
    }

    async fn run(&self, stage: &'static str, script: &str, args: &[String]) -> Result<(), ProcessError> {
        let program = self.script_dir.join(script);
        tracing::info!(stage, program = %program.display(), ?args, "running script");
        let status = Command::new(&program)
            .args(args)
            .status()
            .await
            .map_err(|source| ProcessError::Spawn {
                program: program.display().to_string(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::NonZeroExit {
                stage,
                code: status.code(),
            })
        }
    }
}

impl ProcessRunner for ScriptRunner {
    async fn setup(
        &self,
        script: &str,
        game: &str,
        worker: usize,
        map_path: &str,
    ) -> Result<(), ProcessError> {
        let args = [game.to_string(), worker.to_string(), map_path.to_string()];
        self.run("setup", script, &args).await
    }

    async fn start(&self, worker: usize, port: u16) -> Result<(), ProcessError> {
        let args = [worker.to_string(), port.to_string()];
        self.run("start", "game.start", &args).await
    }

    async fn is_alive(&self, worker: usize) -> bool {
        let program = self.script_dir.join("game.exists");
        match Command::new(&program)
            .arg(worker.to_string())
            .stdout(Stdio::null())
            .status()
            .await
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!(worker, error = %e, "liveness probe could not run");
                false
            }
        }
    }

    fn exec(&self, program: &str, args: &[String]) -> Result<(), ProcessError> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
            .map_err(|source| ProcessError::Spawn {
                program: program.to_string(),
                source,
            })
    }
}

// ---------------------------------------------------------------------------
// Boot sequence
// ---------------------------------------------------------------------------

/// Everything a boot task needs, captured up front so the task never
/// reads engine state.
#[derive(Debug)]
struct BootPlan {
    session: SessionId,
    worker: usize,
    game: String,
    setup_script: String,
    map_path: String,
    port: u16,
    config_path: PathBuf,
    config: Vec<u8>,
}

async fn write_session_config(path: &Path, data: &[u8]) -> Result<(), ProcessError> {
    let config_err = |source| ProcessError::Config {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(config_err)?;
    }
    tokio::fs::write(path, data).await.map_err(config_err)
}

async fn run_boot<P: ProcessRunner>(runner: &P, plan: &BootPlan) -> Result<(), ProcessError> {
    runner
        .setup(&plan.setup_script, &plan.game, plan.worker, &plan.map_path)
        .await?;
    write_session_config(&plan.config_path, &plan.config).await?;
    runner.start(plan.worker, plan.port).await
}

impl<T: Transport, P: ProcessRunner> Engine<T, P> {
    /// Assigns `session_id` to worker `index` and launches its boot
    /// sequence.
    ///
    /// The map and play mode are settled here: an explicit choice that
    /// still exists in the catalog wins, otherwise one is picked at
    /// random. The choices are written back to the session so the worker
    /// and the save files agree.
    ///
    /// # Errors
    /// Fails without changing anything if the worker cannot enter BOOT.
    /// Returns `Ok(false)` if the session is gone or has no map to boot.
    pub(crate) fn start_session(&mut self, session_id: SessionId, index: usize) -> Result<bool, StoreError> {
        let Some(session) = self.store.session(&session_id) else {
            return Ok(false);
        };
        let game = session.name.clone();
        let map_choice = session.map_id.chosen().map(str::to_string);
        let mode_choice = session.play_mode.chosen().map(str::to_string);

        let world = match map_choice.and_then(|id| self.catalog.find_world(&game, &id)) {
            Some(world) => world,
            None => match self.catalog.worlds_for(&game).choose(&mut self.rng) {
                Some(world) => world.clone(),
                None => return Ok(false),
            },
        };
        let mode = match mode_choice.and_then(|id| self.catalog.find_mode(&game, &id)) {
            Some(mode) => Some(mode),
            None => self.catalog.modes_for(&game).choose(&mut self.rng).cloned(),
        };

        let mut updated = session.clone();
        updated.server_id = WorkerSlot::Assigned(index);
        updated.map_id = Selection::Chosen(world.map_id.clone());
        updated.play_mode = mode.map_or(Selection::RandomAtBoot, |m| Selection::Chosen(m.mode_id));
        let config = match serde_json::to_vec(&updated) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(%session_id, error = %e, "cannot encode session config");
                return Ok(false);
            }
        };

        if let Some(worker) = self.store.worker_mut(index) {
            worker.begin_boot(session_id)?;
        }
        let plan = BootPlan {
            session: session_id,
            worker: index,
            game: game.clone(),
            setup_script: updated.setup_script.clone(),
            map_path: world.map_path.clone(),
            port: self.config.worker_port(index),
            config_path: self.config.session_config_path(index),
            config,
        };
        if let Some(session) = self.store.session_mut(&session_id) {
            *session = updated;
        }
        tracing::info!(
            %session_id,
            worker = index,
            %game,
            map = %world.map_id,
            "booting session"
        );

        let runner = Arc::clone(&self.runner);
        let tasks = self.tasks.clone();
        tokio::spawn(async move {
            let outcome = run_boot(&*runner, &plan).await;
            if let Err(e) = &outcome {
                tracing::error!(session_id = %plan.session, worker = plan.worker, error = %e, "boot failed");
            }
            let ok = outcome.is_ok();
            let (session, worker) = (plan.session, plan.worker);
            if tasks
                .submit(move |engine: &mut Engine<T, P>| engine.finish_boot(session, worker, ok))
                .is_err()
            {
                tracing::warn!(%session, worker, "event loop gone before boot finished");
            }
        });
        Ok(true)
    }

    /// Applies the outcome of a boot sequence. Runs on the event loop.
    pub(crate) fn finish_boot(&mut self, session_id: SessionId, index: usize, ok: bool) {
        let hosts_session = self
            .store
            .worker(index)
            .is_some_and(|w| w.current_game == Some(session_id));
        if !hosts_session {
            tracing::warn!(%session_id, worker = index, "stale boot result ignored");
            return;
        }
        let Some(session) = self.store.session(&session_id).cloned() else {
            tracing::warn!(%session_id, worker = index, "session vanished while booting");
            if let Some(worker) = self.store.worker_mut(index) {
                worker.reset();
            }
            return;
        };

        if !ok {
            let msg = ChatMessage::colored(
                ChatColor::Red,
                "Your game could not be created. Please contact an administrator, or try again later.",
            );
            for member in &session.members {
                self.notify(*member, &msg);
                if self.store.current_game(member) == Some(session_id) {
                    self.store.clear_current_game(member);
                }
            }
            self.store.remove_session(&session_id);
            if let Some(worker) = self.store.worker_mut(index) {
                worker.reset();
            }
            return;
        }

        if let Some(worker) = self.store.worker_mut(index) {
            if let Err(e) = worker.mark_running() {
                tracing::warn!(%session_id, error = %e, "boot finished for a worker that moved on");
                return;
            }
        }
        tracing::info!(%session_id, worker = index, "session running");
        let ready = ChatMessage::colored(ChatColor::Green, "Your game is ready.");
        for member in &session.members {
            self.notify(*member, &ready);
            self.move_player(*member, index);
        }
        if self.transport.is_connected(&self.config.worker_endpoint(index)) {
            self.flush_deferred(index);
        }
    }
}
