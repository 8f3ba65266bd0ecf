//! Rive Session - the process-wide per-user variable store.
//!
//! Sessions are keyed by an opaque user id, created lazily on first write
//! (or first turn), and live until explicitly purged.
//!
//! # Locking
//!
//! - The session map is a sharded `DashMap`; a shard lock is only held long
//!   enough to clone the session's `Arc`.
//! - Each session has its own variable lock. It is a leaf lock: nothing else
//!   is ever acquired while it is held.
//! - Each session also has a turn lock, held by the engine for the whole of
//!   one reply so that utterances of the same user are processed one at a
//!   time. Replies for different users never contend.

mod store;

pub use store::{VariableStore, Vars};
