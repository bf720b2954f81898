//! The engine: sole owner of the daemon's state.
//!
//! An [`Engine`] lives inside the event loop and is only ever touched by
//! tasks the loop executes, one at a time. That is what lets everything
//! below take `&mut self` without a lock in sight. The other modules of
//! this crate add `impl Engine` blocks for their part of the behavior;
//! this one holds the fields and the outbound plumbing they share.

use std::sync::Arc;
use std::time::Duration;

use gamehost_catalog::{GameCatalog, UNKNOWN_NAME};
use gamehost_protocol::{
    ChatMessage, ChatRenderer, Codec, JsonCodec, PlayerId, PlayerMessage, SendPlayerServer,
    WorkerInstruction, channel,
};
use gamehost_queue::{Task, TaskSender};
use gamehost_store::{SessionStore, WorkerState};
use gamehost_transport::{OnlinePlayer, Transport};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::{DaemonConfig, ProcessRunner};

/// A unit of work for the event loop.
pub type EngineTask<T, P> = Task<Engine<T, P>>;

/// State and collaborators owned by the event loop.
pub struct Engine<T: Transport, P: ProcessRunner> {
    pub(crate) config: DaemonConfig,
    pub(crate) store: SessionStore,
    pub(crate) catalog: GameCatalog,
    pub(crate) transport: Arc<T>,
    pub(crate) runner: Arc<P>,
    pub(crate) renderer: Arc<dyn ChatRenderer>,
    pub(crate) codec: JsonCodec,
    pub(crate) rng: StdRng,
    /// A sender into our own queue, for work that finishes elsewhere.
    pub(crate) tasks: TaskSender<Engine<T, P>>,
    pub(crate) stop_requested: bool,
    pub(crate) pause: Option<Duration>,
}

impl<T: Transport, P: ProcessRunner> Engine<T, P> {
    pub(crate) fn new(
        config: DaemonConfig,
        store: SessionStore,
        catalog: GameCatalog,
        transport: Arc<T>,
        runner: Arc<P>,
        renderer: Arc<dyn ChatRenderer>,
        tasks: TaskSender<Engine<T, P>>,
    ) -> Self {
        Self {
            config,
            store,
            catalog,
            transport,
            runner,
            renderer,
            codec: JsonCodec,
            rng: StdRng::from_os_rng(),
            tasks,
            stop_requested: false,
            pause: None,
        }
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// Asks the loop to save and exit after the current task.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn is_stopping(&self) -> bool {
        self.stop_requested
    }

    /// Replaces the random source, e.g. with a seeded one.
    pub fn set_rng(&mut self, rng: StdRng) {
        self.rng = rng;
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    pub(crate) fn online_by_name(&self, name: &str) -> Option<OnlinePlayer> {
        self.transport
            .online_players()
            .into_iter()
            .find(|p| p.name == name)
    }

    /// Best known name of a player: the name cache, then the user record,
    /// then whoever is online with that id.
    pub(crate) fn player_name(&mut self, id: &PlayerId) -> String {
        if let Some(name) = self.catalog.player_name(id) {
            return name;
        }
        if let Some(name) = self.store.user(id).and_then(|u| u.name.clone()) {
            return name;
        }
        self.transport
            .online_players()
            .into_iter()
            .find(|p| p.id == *id)
            .map_or_else(|| UNKNOWN_NAME.to_string(), |p| p.name)
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Encodes `msg` and sends it to `endpoint`, or to everyone when
    /// `endpoint` is `None`. Failures are logged; nothing is retried.
    pub(crate) fn publish<M: Serialize>(&self, endpoint: Option<&str>, chan: &str, msg: &M) {
        let data = match self.codec.encode(msg) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(channel = chan, error = %e, "failed to encode message");
                return;
            }
        };
        let result = match endpoint {
            Some(endpoint) => self.transport.send(endpoint, chan, &data),
            None => self.transport.broadcast(chan, &data),
        };
        if let Err(e) = result {
            tracing::debug!(channel = chan, endpoint, error = %e, "message not delivered");
        }
    }

    /// Shows `msg` to `target`. With a known `server` the message goes
    /// straight there, otherwise it is broadcast for whichever proxy holds
    /// the player.
    pub(crate) fn send_chat(&self, target: PlayerId, server: Option<&str>, msg: &ChatMessage) {
        let payload = PlayerMessage {
            target,
            chat: self.renderer.render(msg),
        };
        self.publish(server, channel::PLAYER_MESSAGE, &payload);
    }

    pub(crate) fn notify(&self, target: PlayerId, msg: &ChatMessage) {
        self.send_chat(target, None, msg);
    }

    /// Tells the network to move `player` onto worker `index`.
    pub(crate) fn move_player(&self, player: PlayerId, index: usize) {
        let msg = SendPlayerServer {
            player,
            server: self.config.worker_endpoint(index),
        };
        self.publish(None, channel::SEND_PLAYER_SERVER, &msg);
    }

    /// Sends `instruction` to worker `index`, or queues it on the worker
    /// record while the worker is booting or its endpoint is unreachable.
    pub(crate) fn send_to_worker(&mut self, index: usize, instruction: WorkerInstruction) {
        let endpoint = self.config.worker_endpoint(index);
        let Some(worker) = self.store.worker(index) else {
            tracing::warn!(worker = index, "instruction for unknown worker dropped");
            return;
        };
        if worker.state == WorkerState::Boot || !self.transport.is_connected(&endpoint) {
            tracing::debug!(worker = index, game = %instruction.game(), "deferring worker instruction");
            if let Some(worker) = self.store.worker_mut(index) {
                worker.post_boot_messages.push(instruction);
            }
            return;
        }
        self.publish(Some(&endpoint), channel::MINIGAMES, &instruction);
    }

    /// Sends every deferred instruction of worker `index`, in order.
    pub(crate) fn flush_deferred(&mut self, index: usize) {
        let has_pending = self
            .store
            .worker(index)
            .is_some_and(|w| !w.post_boot_messages.is_empty());
        if !has_pending {
            return;
        }
        let Some(worker) = self.store.worker_mut(index) else {
            return;
        };
        let pending = std::mem::take(&mut worker.post_boot_messages);
        let endpoint = self.config.worker_endpoint(index);
        tracing::info!(worker = index, count = pending.len(), "flushing deferred instructions");
        for instruction in &pending {
            self.publish(Some(&endpoint), channel::MINIGAMES, instruction);
        }
    }

    /// A worker endpoint came online.
    pub(crate) fn on_endpoint_connected(&mut self, name: &str) {
        match self.config.worker_index(name) {
            Some(index) => {
                tracing::info!(endpoint = name, worker = index, "worker endpoint connected");
                self.flush_deferred(index);
            }
            None => tracing::debug!(endpoint = name, "endpoint connected"),
        }
    }
}
