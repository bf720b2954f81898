//! Durable records for gamehost: users, workers, and open game sessions.
//!
//! [`SessionStore`] owns the three collections. Mutating accessors set a
//! per-collection dirty flag instead of writing; the event loop calls
//! [`SessionStore::flush`] once per iteration, so a burst of changes turns
//! into a single write.
//!
//! Each collection is saved as a JSON list of flat records. Loading skips
//! records it cannot understand and treats a missing file as empty.

mod error;
mod session;
mod store;
mod user;
mod worker;

pub use error::StoreError;
pub use session::{GameSession, Selection, SessionStage, WorkerSlot};
pub use store::{GAMES_FILE, SessionStore, USERS_FILE, WORKERS_FILE};
pub use user::User;
pub use worker::{Worker, WorkerState};
