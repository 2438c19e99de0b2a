//! Match room lifecycle
//!
//! Rooms are private channels keyed by channel id; the store holds the
//! participants of every open room.

pub mod access;
pub mod manager;
pub mod scheduler;

pub use access::{is_host, MemberAccess, Requester};
pub use manager::{ClosedMatch, MatchManager, OpenedMatch, ParticipantAdded, DEFAULT_DELETION_DELAY};
pub use scheduler::{schedule_deletion, ScheduledDeletion};
