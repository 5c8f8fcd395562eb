//! Foundational low-level utilities shared across flagger crates.
//!
//! Provides identifier newtypes, the wall-clock abstraction used for rate
//! limiting, and the atomic file-write helper used by configuration stores.

pub mod atomic_io;
pub mod ids;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use ids::{ChannelId, CommunityId, MessageId, RoleId, UserId};
pub use time_utils::{current_unix_timestamp_ms, Clock, ManualClock, SystemClock};
