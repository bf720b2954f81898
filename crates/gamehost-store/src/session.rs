//! Game sessions: ephemeral instances of a template.

use gamehost_catalog::GameTemplate;
use gamehost_protocol::{PlayerId, SessionId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// A map or play mode choice.
///
/// Stored as a nullable string: `null` means "pick one at random when
/// the session boots".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Selection {
    #[default]
    RandomAtBoot,
    Chosen(String),
}

impl Selection {
    pub fn chosen(&self) -> Option<&str> {
        match self {
            Self::RandomAtBoot => None,
            Self::Chosen(id) => Some(id),
        }
    }
}

impl From<Option<String>> for Selection {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::RandomAtBoot, Self::Chosen)
    }
}

impl From<Selection> for Option<String> {
    fn from(value: Selection) -> Self {
        match value {
            Selection::RandomAtBoot => None,
            Selection::Chosen(id) => Some(id),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerSlot
// ---------------------------------------------------------------------------

/// The worker a session is assigned to. Stored as `-1` or the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum WorkerSlot {
    #[default]
    Unassigned,
    Assigned(usize),
}

impl WorkerSlot {
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Unassigned => None,
            Self::Assigned(i) => Some(i),
        }
    }
}

impl From<i64> for WorkerSlot {
    fn from(value: i64) -> Self {
        usize::try_from(value).map_or(Self::Unassigned, Self::Assigned)
    }
}

impl From<WorkerSlot> for i64 {
    fn from(value: WorkerSlot) -> Self {
        match value {
            WorkerSlot::Unassigned => -1,
            WorkerSlot::Assigned(i) => i64::try_from(i).unwrap_or(i64::MAX),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStage
// ---------------------------------------------------------------------------

/// Where a live session is in its lifecycle.
///
/// Derived, never stored: a session with no worker is `Pending`; one with
/// a worker is `Running` once that worker reached RUN and `Booting`
/// before. Terminated sessions are simply gone from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Pending,
    Booting,
    Running,
}

impl std::fmt::Display for SessionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Booting => write!(f, "Booting"),
            Self::Running => write!(f, "Running"),
        }
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

fn yes() -> bool {
    true
}

/// One instance of a game being set up, played, or torn down.
///
/// The first block of fields is copied from the [`GameTemplate`] when the
/// session is created. `members`, `spectators` and `invitees` are ordered
/// sets: use the methods below rather than pushing directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub shorthand: String,
    #[serde(default)]
    pub priority: i32,
    pub setup_script: String,
    #[serde(default)]
    pub min_players: usize,
    #[serde(default)]
    pub connect_aware: bool,

    pub unique_id: SessionId,
    #[serde(default)]
    pub map_id: Selection,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub members: Vec<PlayerId>,
    #[serde(default)]
    pub spectators: Vec<PlayerId>,
    #[serde(default)]
    pub invitees: Vec<PlayerId>,
    pub owner: PlayerId,
    #[serde(default)]
    pub public: bool,
    #[serde(default = "yes")]
    pub players_may_join: bool,
    #[serde(default = "yes")]
    pub players_may_spectate: bool,
    #[serde(default)]
    pub server_id: WorkerSlot,
    #[serde(default)]
    pub play_mode: Selection,
}

impl GameSession {
    /// A fresh Pending session of `template`, owned by `owner`, who is
    /// also its only member.
    pub fn from_template(template: &GameTemplate, unique_id: SessionId, owner: PlayerId) -> Self {
        Self {
            name: template.name.clone(),
            display_name: template.display_name.clone(),
            description: template.description.clone(),
            shorthand: template.shorthand.clone(),
            priority: template.priority,
            setup_script: template.setup_script.clone(),
            min_players: template.min_players,
            connect_aware: template.connect_aware,
            unique_id,
            map_id: Selection::RandomAtBoot,
            debug: false,
            members: vec![owner],
            spectators: Vec::new(),
            invitees: Vec::new(),
            owner,
            public: false,
            players_may_join: true,
            players_may_spectate: true,
            server_id: WorkerSlot::Unassigned,
            play_mode: Selection::RandomAtBoot,
        }
    }

    /// `true` until a worker has been assigned.
    pub fn is_pending(&self) -> bool {
        self.server_id == WorkerSlot::Unassigned
    }

    pub fn is_owner(&self, id: &PlayerId) -> bool {
        self.owner == *id
    }

    pub fn is_member(&self, id: &PlayerId) -> bool {
        self.members.contains(id)
    }

    pub fn is_spectator(&self, id: &PlayerId) -> bool {
        self.spectators.contains(id)
    }

    pub fn is_invited(&self, id: &PlayerId) -> bool {
        self.invitees.contains(id)
    }

    /// Whether `id` may see this session: it is public, or `id` is the
    /// owner, a member, or invited.
    pub fn is_visible_to(&self, id: &PlayerId) -> bool {
        self.public || self.is_owner(id) || self.is_member(id) || self.is_invited(id)
    }

    /// Whether `id` is allowed in by invitation rules alone.
    pub fn is_eligible(&self, id: &PlayerId) -> bool {
        self.public || self.is_invited(id)
    }

    /// Adds a member, removing them from the invitees.
    pub fn add_member(&mut self, id: PlayerId) {
        self.invitees.retain(|p| *p != id);
        insert_unique(&mut self.members, id);
    }

    /// Adds a spectating member.
    pub fn add_spectator(&mut self, id: PlayerId) {
        self.add_member(id);
        insert_unique(&mut self.spectators, id);
    }

    /// Removes `id` from members and spectators. Returns `true` if they
    /// were a member.
    pub fn remove_member(&mut self, id: &PlayerId) -> bool {
        self.spectators.retain(|p| p != id);
        let before = self.members.len();
        self.members.retain(|p| p != id);
        self.members.len() != before
    }

    /// Adds an invitee. Returns `false` if they already were one.
    pub fn invite(&mut self, id: PlayerId) -> bool {
        insert_unique(&mut self.invitees, id)
    }
}

fn insert_unique(set: &mut Vec<PlayerId>, id: PlayerId) -> bool {
    if set.contains(&id) {
        return false;
    }
    set.push(id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pid(n: u128) -> PlayerId {
        PlayerId(uuid::Uuid::from_u128(n))
    }

    fn session() -> GameSession {
        let template = GameTemplate::named("colorfall");
        GameSession::from_template(&template, SessionId::generate(), pid(1))
    }

    #[test]
    fn test_from_template_owner_is_sole_member() {
        let s = session();
        assert_eq!(s.members, [pid(1)]);
        assert!(s.is_owner(&pid(1)));
        assert!(s.is_pending());
        assert!(!s.public);
        assert_eq!(s.map_id, Selection::RandomAtBoot);
    }

    #[test]
    fn test_add_member_removes_invitee() {
        let mut s = session();
        s.invite(pid(2));
        s.add_member(pid(2));
        assert!(s.is_member(&pid(2)));
        assert!(!s.is_invited(&pid(2)));
    }

    #[test]
    fn test_add_spectator_is_also_member() {
        let mut s = session();
        s.add_spectator(pid(3));
        s.add_spectator(pid(3));
        assert_eq!(s.members, [pid(1), pid(3)]);
        assert_eq!(s.spectators, [pid(3)]);
    }

    #[test]
    fn test_remove_member_by_id() {
        let mut s = session();
        s.add_spectator(pid(2));
        assert!(s.remove_member(&pid(2)));
        assert!(!s.is_spectator(&pid(2)));
        assert!(!s.remove_member(&pid(2)));
    }

    #[test]
    fn test_invite_twice_returns_false() {
        let mut s = session();
        assert!(s.invite(pid(2)));
        assert!(!s.invite(pid(2)));
    }

    #[test]
    fn test_is_visible_to_private_session() {
        let mut s = session();
        s.invite(pid(2));
        assert!(s.is_visible_to(&pid(1)));
        assert!(s.is_visible_to(&pid(2)));
        assert!(!s.is_visible_to(&pid(3)));
        s.public = true;
        assert!(s.is_visible_to(&pid(3)));
    }

    #[test]
    fn test_selection_serializes_as_nullable_string() {
        assert_eq!(serde_json::to_value(Selection::RandomAtBoot).unwrap(), json!(null));
        assert_eq!(
            serde_json::to_value(Selection::Chosen("arena".into())).unwrap(),
            json!("arena")
        );
    }

    #[test]
    fn test_worker_slot_serializes_as_signed_index() {
        assert_eq!(serde_json::to_value(WorkerSlot::Unassigned).unwrap(), json!(-1));
        assert_eq!(serde_json::to_value(WorkerSlot::Assigned(3)).unwrap(), json!(3));
        let slot: WorkerSlot = serde_json::from_value(json!(-7)).unwrap();
        assert_eq!(slot, WorkerSlot::Unassigned);
    }

    #[test]
    fn test_session_record_defaults_admission_flags() {
        let s = session();
        let mut value = serde_json::to_value(&s).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("players_may_join");
        obj.remove("players_may_spectate");
        obj.remove("map_id");
        let back: GameSession = serde_json::from_value(value).unwrap();
        assert!(back.players_may_join);
        assert!(back.players_may_spectate);
        assert_eq!(back, s);
    }
}
