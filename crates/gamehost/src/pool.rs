//! Worker pool reconciliation.
//!
//! Crashed workers do not announce themselves. Each pass of the event
//! loop polls every RUN worker's liveness probe and tears down whatever a
//! dead one was hosting, then sweeps the sessions for membership that no
//! longer agrees with the users' own records. Both halves only write when
//! they find something to fix, so a quiet system stays quiet.

use gamehost_protocol::{PlayerId, SessionId};
use gamehost_store::WorkerState;
use gamehost_transport::Transport;

use crate::{Engine, ProcessRunner};

impl<T: Transport, P: ProcessRunner> Engine<T, P> {
    /// One full reconciliation pass.
    pub async fn reconcile(&mut self) {
        self.probe_workers().await;
        self.collect_garbage();
    }

    /// Asks the liveness probe about every RUN worker and recovers the
    /// dead ones.
    pub async fn probe_workers(&mut self) {
        let running: Vec<usize> = self
            .store
            .workers()
            .iter()
            .filter(|w| w.state == WorkerState::Run)
            .map(|w| w.index)
            .collect();
        for index in running {
            if self.runner.is_alive(index).await {
                continue;
            }
            tracing::warn!(worker = index, "worker process is gone");
            self.recover_worker(index);
        }
    }

    /// Deletes the session hosted by worker `index`, releases its
    /// members, and resets the worker to OFF.
    pub(crate) fn recover_worker(&mut self, index: usize) {
        let hosted = self.store.worker(index).and_then(|w| w.current_game);
        if let Some(session_id) = hosted {
            if let Some(session) = self.store.remove_session(&session_id) {
                for member in &session.members {
                    if self.store.current_game(member) == Some(session_id) {
                        self.store.clear_current_game(member);
                    }
                }
            }
        }
        if let Some(worker) = self.store.worker_mut(index) {
            worker.reset();
        }
    }

    /// Repairs membership that disagrees between users and sessions.
    ///
    /// - A member whose own `current_game` points elsewhere is dropped
    ///   from the session, as are spectators who are not members.
    /// - A session left without members is deleted.
    /// - A session whose owner was dropped passes to its first member.
    /// - A user pointing at a session that does not list them is cleared.
    ///
    /// Returns `true` if anything changed.
    pub fn collect_garbage(&mut self) -> bool {
        let mut changed = false;

        for id in self.store.session_ids() {
            let Some(session) = self.store.session(&id) else {
                continue;
            };
            let stale: Vec<PlayerId> = session
                .members
                .iter()
                .filter(|m| self.store.current_game(m) != Some(id))
                .copied()
                .collect();
            let stray_spectators = session.spectators.iter().any(|s| !session.is_member(s));
            let empty = session.members.len() == stale.len();
            let owner_gone = stale.contains(&session.owner) || !session.is_member(&session.owner);
            if stale.is_empty() && !stray_spectators && !empty && !owner_gone {
                continue;
            }

            changed = true;
            if empty {
                tracing::info!(session_id = %id, "removing empty session");
                self.store.remove_session(&id);
                continue;
            }
            let Some(session) = self.store.session_mut(&id) else {
                continue;
            };
            for member in &stale {
                session.remove_member(member);
            }
            let members = session.members.clone();
            session.spectators.retain(|s| members.contains(s));
            if !session.is_member(&session.owner) {
                let new_owner = session.members[0];
                tracing::info!(session_id = %id, owner = %new_owner, "session owner left; transferring");
                session.owner = new_owner;
            }
        }

        let orphaned: Vec<PlayerId> = self
            .store
            .users()
            .filter(|u| {
                u.current_game
                    .is_some_and(|g| !self.session_lists(&g, &u.id))
            })
            .map(|u| u.id)
            .collect();
        for id in &orphaned {
            tracing::debug!(player_id = %id, "clearing stale current game");
            self.store.clear_current_game(id);
            changed = true;
        }

        changed
    }

    fn session_lists(&self, session: &SessionId, player: &PlayerId) -> bool {
        self.store
            .session(session)
            .is_some_and(|s| s.is_member(player))
    }
}
