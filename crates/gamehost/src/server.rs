//! `Daemon` builder, event loop, and the handle everything else talks to.
//!
//! The daemon ties the layers together: catalog and store feed the
//! [`Engine`], the engine is owned by the loop in [`Daemon::run`], and
//! the outside world (transport callbacks, the console thread) holds a
//! [`DaemonHandle`] that can only enqueue work.

use std::sync::Arc;

use gamehost_catalog::GameCatalog;
use gamehost_protocol::{ChatRenderer, JsonChatRenderer, channel};
use gamehost_queue::{TaskError, TaskReceiver, TaskSender, execute, task_queue};
use gamehost_store::SessionStore;
use gamehost_transport::{OnlinePlayer, Transport};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;

use crate::{DaemonConfig, Engine, GamehostError, ProcessRunner};

/// Builder for configuring and starting a [`Daemon`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use gamehost::prelude::*;
///
/// let daemon = DaemonBuilder::new()
///     .config(DaemonConfig::default())
///     .build(Arc::new(transport), Arc::new(ScriptRunner::new("script")));
/// let handle = daemon.handle();
/// daemon.run().await?;
/// ```
pub struct DaemonBuilder {
    config: DaemonConfig,
    catalog: Option<GameCatalog>,
    renderer: Arc<dyn ChatRenderer>,
    seed: Option<u64>,
}

impl DaemonBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: DaemonConfig::default(),
            catalog: None,
            renderer: Arc::new(JsonChatRenderer),
            seed: None,
        }
    }

    pub fn config(mut self, config: DaemonConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a prepared catalog instead of loading one from the configured
    /// paths.
    pub fn catalog(mut self, catalog: GameCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn ChatRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Seeds the map and mode picker so boots are reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Loads the saved state and assembles the daemon.
    ///
    /// Nothing runs until [`Daemon::run`] or [`Daemon::tick`] is called,
    /// but handles taken before then already accept work.
    pub fn build<T: Transport, P: ProcessRunner>(self, transport: Arc<T>, runner: Arc<P>) -> Daemon<T, P> {
        let mut store = SessionStore::new(&self.config.save_dir, self.config.worker_count);
        store.load_all();
        let catalog = self
            .catalog
            .unwrap_or_else(|| GameCatalog::new(self.config.catalog_paths()));

        let (tasks, receiver) = task_queue();
        let mut engine = Engine::new(
            self.config,
            store,
            catalog,
            transport,
            runner,
            self.renderer,
            tasks.clone(),
        );
        if let Some(seed) = self.seed {
            engine.set_rng(StdRng::seed_from_u64(seed));
        }

        Daemon {
            engine,
            receiver,
            handle: DaemonHandle { tasks },
            last_reconcile: None,
        }
    }
}

impl Default for DaemonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The event loop and the state it owns.
pub struct Daemon<T: Transport, P: ProcessRunner> {
    engine: Engine<T, P>,
    receiver: TaskReceiver<Engine<T, P>>,
    handle: DaemonHandle<T, P>,
    last_reconcile: Option<Instant>,
}

impl<T: Transport, P: ProcessRunner> Daemon<T, P> {
    /// A handle for submitting work. Clone it freely.
    pub fn handle(&self) -> DaemonHandle<T, P> {
        self.handle.clone()
    }

    pub fn engine(&self) -> &Engine<T, P> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<T, P> {
        &mut self.engine
    }

    /// Number of tasks waiting to run.
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }

    /// One pass of the loop.
    ///
    /// Saves whatever changed, reconciles if a poll interval has passed
    /// since the last time, then waits up to one poll interval for a task
    /// and runs it. Returns `false` once a stop was requested.
    pub async fn tick(&mut self) -> bool {
        if let Err(e) = self.engine.store.flush() {
            tracing::error!(error = %e, "failed to save state");
        }

        let interval = self.engine.config.poll_interval;
        let due = self.last_reconcile.is_none_or(|at| at.elapsed() >= interval);
        if due {
            self.engine.reconcile().await;
            self.last_reconcile = Some(Instant::now());
        }

        if let Some(task) = self.receiver.next_task(interval).await {
            execute(task, &mut self.engine);
        }

        if let Some(pause) = self.engine.pause.take() {
            tracing::info!(seconds = pause.as_secs(), "main loop sleeping");
            tokio::time::sleep(pause).await;
        }

        !self.engine.is_stopping()
    }

    /// Runs the loop until a stop is requested, then saves everything.
    ///
    /// # Errors
    /// Returns the error of the final save, if it failed.
    pub async fn run(mut self) -> Result<(), GamehostError> {
        tracing::info!(workers = self.engine.config.worker_count, "gamehost daemon running");
        while self.tick().await {}
        tracing::info!("gamehost daemon stopping");
        self.engine.store.save_all()?;
        Ok(())
    }
}

/// Entry points for everything outside the loop.
///
/// Every method only enqueues; none touches the state directly, so they
/// are safe to call from any thread.
pub struct DaemonHandle<T: Transport, P: ProcessRunner> {
    tasks: TaskSender<Engine<T, P>>,
}

impl<T: Transport, P: ProcessRunner> Clone for DaemonHandle<T, P> {
    fn clone(&self) -> Self {
        Self {
            tasks: self.tasks.clone(),
        }
    }
}

impl<T: Transport, P: ProcessRunner> DaemonHandle<T, P> {
    /// A message arrived from endpoint `from` on `chan`. Only the control
    /// channel is of interest; everything else is ignored.
    pub fn handle_message(&self, from: &str, chan: &str, data: &[u8]) -> Result<(), TaskError> {
        if chan != channel::MINIGAMES {
            return Ok(());
        }
        let (from, data) = (from.to_string(), data.to_vec());
        self.tasks
            .submit(move |engine: &mut Engine<T, P>| engine.route_message(&from, &data))
    }

    /// A player ran a remote command. Only `game` / `games` is handled.
    pub fn handle_remote_command(
        &self,
        sender: OnlinePlayer,
        server: &str,
        args: &[String],
    ) -> Result<(), TaskError> {
        let Some((first, rest)) = args.split_first() else {
            return Ok(());
        };
        if !matches!(first.to_lowercase().as_str(), "game" | "games") {
            return Ok(());
        }
        let (server, rest) = (server.to_string(), rest.to_vec());
        self.tasks.submit(move |engine: &mut Engine<T, P>| {
            engine.player_command(&sender, &server, &rest);
        })
    }

    /// An endpoint joined the network.
    pub fn endpoint_connected(&self, name: &str) -> Result<(), TaskError> {
        let name = name.to_string();
        self.tasks
            .submit(move |engine: &mut Engine<T, P>| engine.on_endpoint_connected(&name))
    }

    /// Runs one console line and waits for its output.
    ///
    /// Blocks the calling thread; call it from a plain thread, never from
    /// inside the runtime.
    pub fn console_blocking(&self, line: &str) -> Result<Vec<String>, TaskError> {
        let Some((cmd, args)) = split_console_line(line) else {
            return Ok(Vec::new());
        };
        self.tasks
            .call_blocking(move |engine: &mut Engine<T, P>| engine.console_command(&cmd, &args))
    }

    /// Async version of [`console_blocking`](Self::console_blocking).
    pub async fn console(&self, line: &str) -> Result<Vec<String>, TaskError> {
        let Some((cmd, args)) = split_console_line(line) else {
            return Ok(Vec::new());
        };
        self.tasks
            .call(move |engine: &mut Engine<T, P>| engine.console_command(&cmd, &args))
            .await
    }

    /// Asks the loop to save and exit.
    pub fn stop(&self) -> Result<(), TaskError> {
        self.tasks.submit(|engine: &mut Engine<T, P>| engine.request_stop())
    }

    /// Runs an arbitrary closure on the loop.
    pub fn submit<F>(&self, task: F) -> Result<(), TaskError>
    where
        F: FnOnce(&mut Engine<T, P>) + Send + 'static,
    {
        self.tasks.submit(task)
    }
}

fn split_console_line(line: &str) -> Option<(String, Vec<String>)> {
    let mut words = line.split_whitespace().map(str::to_string);
    let cmd = words.next()?.to_lowercase();
    Some((cmd, words.collect()))
}
