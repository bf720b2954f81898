//! The authoritative user, worker and session maps, plus persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gamehost_protocol::{PlayerId, SessionId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{GameSession, SessionStage, StoreError, User, Worker, WorkerSlot, WorkerState};

pub const USERS_FILE: &str = "users.save";
pub const WORKERS_FILE: &str = "servers.save";
pub const GAMES_FILE: &str = "games.save";

#[derive(Debug, Default, Clone, Copy)]
struct Dirty {
    users: bool,
    workers: bool,
    sessions: bool,
}

impl Dirty {
    fn any(self) -> bool {
        self.users || self.workers || self.sessions
    }

    fn all() -> Self {
        Self {
            users: true,
            workers: true,
            sessions: true,
        }
    }
}

/// Owns every user, worker and session record.
///
/// Read accessors are free. Every `_mut` accessor and every insert or
/// removal marks its collection dirty, whether or not the caller ends up
/// changing anything, so callers that want to stay quiet (reconciliation)
/// check with the read accessors first.
#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    users: BTreeMap<PlayerId, User>,
    workers: Vec<Worker>,
    sessions: BTreeMap<SessionId, GameSession>,
    dirty: Dirty,
}

impl SessionStore {
    /// An empty store with `worker_count` OFF workers, saving under `dir`.
    pub fn new(dir: impl Into<PathBuf>, worker_count: usize) -> Self {
        Self {
            dir: dir.into(),
            users: BTreeMap::new(),
            workers: (0..worker_count).map(Worker::new).collect(),
            sessions: BTreeMap::new(),
            dirty: Dirty::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn user(&self, id: &PlayerId) -> Option<&User> {
        self.users.get(id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Returns the user, creating it on first contact. A known `name`
    /// refreshes the cached one.
    pub fn get_or_create_user(&mut self, id: PlayerId, name: Option<&str>) -> &mut User {
        let dirty = &mut self.dirty;
        let user = self.users.entry(id).or_insert_with(|| {
            dirty.users = true;
            User::new(id)
        });
        if let Some(name) = name {
            if user.name.as_deref() != Some(name) {
                user.name = Some(name.to_string());
                dirty.users = true;
            }
        }
        user
    }

    pub fn current_game(&self, id: &PlayerId) -> Option<SessionId> {
        self.users.get(id).and_then(|u| u.current_game)
    }

    pub fn set_current_game(&mut self, id: PlayerId, session: SessionId) {
        self.get_or_create_user(id, None).current_game = Some(session);
        self.dirty.users = true;
    }

    /// Forgets the player's current game. The user record itself is
    /// dropped since nothing else about them is worth keeping.
    pub fn clear_current_game(&mut self, id: &PlayerId) -> Option<SessionId> {
        let user = self.users.remove(id)?;
        self.dirty.users = true;
        user.current_game
    }

    // -----------------------------------------------------------------------
    // Workers
    // -----------------------------------------------------------------------

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn worker(&self, index: usize) -> Option<&Worker> {
        self.workers.get(index)
    }

    pub fn worker_mut(&mut self, index: usize) -> Option<&mut Worker> {
        let worker = self.workers.get_mut(index)?;
        self.dirty.workers = true;
        Some(worker)
    }

    /// The lowest-index worker that can take a session.
    pub fn free_worker(&self) -> Option<usize> {
        self.workers.iter().position(Worker::is_free)
    }

    /// Resets every worker hosting `session` to OFF.
    pub fn release_workers_of(&mut self, session: &SessionId) {
        for worker in &mut self.workers {
            if worker.current_game.as_ref() == Some(session) {
                worker.reset();
                self.dirty.workers = true;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    pub fn session(&self, id: &SessionId) -> Option<&GameSession> {
        self.sessions.get(id)
    }

    pub fn session_mut(&mut self, id: &SessionId) -> Option<&mut GameSession> {
        let session = self.sessions.get_mut(id)?;
        self.dirty.sessions = true;
        Some(session)
    }

    /// Every open session, in id order.
    pub fn sessions(&self) -> impl Iterator<Item = &GameSession> {
        self.sessions.values()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn insert_session(&mut self, session: GameSession) {
        tracing::info!(session_id = %session.unique_id, game = %session.name, "session stored");
        self.sessions.insert(session.unique_id, session);
        self.dirty.sessions = true;
    }

    pub fn remove_session(&mut self, id: &SessionId) -> Option<GameSession> {
        let session = self.sessions.remove(id)?;
        tracing::info!(session_id = %id, game = %session.name, "session removed");
        self.dirty.sessions = true;
        Some(session)
    }

    /// The lifecycle stage of `session`, judged by its worker.
    pub fn stage_of(&self, session: &GameSession) -> SessionStage {
        match session.server_id.index().and_then(|i| self.workers.get(i)) {
            None => SessionStage::Pending,
            Some(w) if w.state == WorkerState::Run => SessionStage::Running,
            Some(_) => SessionStage::Booting,
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn is_dirty(&self) -> bool {
        self.dirty.any()
    }

    /// Marks every collection dirty.
    pub fn mark_all_dirty(&mut self) {
        self.dirty = Dirty::all();
    }

    /// Writes the collections marked dirty and clears their flags.
    ///
    /// Returns `Ok(true)` if anything was written. A collection whose
    /// write fails stays dirty, so the next flush retries it.
    pub fn flush(&mut self) -> Result<bool, StoreError> {
        if !self.dirty.any() {
            return Ok(false);
        }
        if self.dirty.users {
            self.save_users()?;
            self.dirty.users = false;
        }
        if self.dirty.workers {
            self.save_workers()?;
            self.dirty.workers = false;
        }
        if self.dirty.sessions {
            self.save_sessions()?;
            self.dirty.sessions = false;
        }
        Ok(true)
    }

    /// Writes all three collections now.
    pub fn save_all(&mut self) -> Result<(), StoreError> {
        self.mark_all_dirty();
        self.flush().map(|_| ())
    }

    fn save_users(&self) -> Result<(), StoreError> {
        let records: Vec<&User> = self.users.values().collect();
        write_records(&self.dir.join(USERS_FILE), &records)
    }

    fn save_workers(&self) -> Result<(), StoreError> {
        write_records(&self.dir.join(WORKERS_FILE), &self.workers)
    }

    fn save_sessions(&self) -> Result<(), StoreError> {
        let records: Vec<&GameSession> = self.sessions.values().collect();
        write_records(&self.dir.join(GAMES_FILE), &records)
    }

    /// Replaces every collection with what is on disk.
    ///
    /// Never fails: unreadable files and malformed records are logged and
    /// skipped. Workers missing from the file stay OFF.
    pub fn load_all(&mut self) {
        self.users = read_records::<User>(&self.dir.join(USERS_FILE))
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let count = self.workers.len();
        self.workers = (0..count).map(Worker::new).collect();
        for worker in read_records::<Worker>(&self.dir.join(WORKERS_FILE)) {
            match self.workers.get_mut(worker.index) {
                Some(slot) => *slot = worker,
                None => tracing::warn!(index = worker.index, "skipping worker beyond pool size"),
            }
        }

        self.sessions = read_records::<GameSession>(&self.dir.join(GAMES_FILE))
            .into_iter()
            .map(|s| (s.unique_id, s))
            .collect();

        self.dirty = Dirty::default();
        self.recover_interrupted_boots();
        tracing::info!(
            users = self.users.len(),
            sessions = self.sessions.len(),
            "store loaded"
        );
    }

    /// A worker saved in BOOT has no boot task behind it any more. It goes
    /// back to OFF and its session returns to pending so it can be started
    /// again.
    fn recover_interrupted_boots(&mut self) {
        for worker in &mut self.workers {
            if worker.state != WorkerState::Boot {
                continue;
            }
            tracing::warn!(worker = worker.index, "worker was saved mid-boot; resetting");
            if let Some(session) = worker.current_game.and_then(|id| self.sessions.get_mut(&id)) {
                session.server_id = WorkerSlot::Unassigned;
                self.dirty.sessions = true;
            }
            worker.reset();
            self.dirty.workers = true;
        }
    }

    /// Drops every user and session and resets every worker to OFF.
    pub fn reset(&mut self) {
        self.users.clear();
        self.sessions.clear();
        for worker in &mut self.workers {
            worker.reset();
        }
        self.mark_all_dirty();
        tracing::info!("store reset");
    }
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let json = serde_json::to_vec(records).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    // Write then rename so a crash never leaves a truncated file behind.
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    tracing::debug!(path = %path.display(), count = records.len(), "saved records");
    Ok(())
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read save file");
            return Vec::new();
        }
    };
    let values: Vec<serde_json::Value> = match serde_json::from_slice(&data) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "save file is not a record list");
            return Vec::new();
        }
    };
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}
