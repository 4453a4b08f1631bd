//! The `topics` module keeps the pre-alert channel topics.
//!
//! [`TopicStore`] is the single owner of the cache and of the
//! `Idle -> Recording -> Idle` / `Idle -> Restoring -> Idle` state machine.
//! It runs inside an actor task; the event loop and the dispatcher only talk
//! to it through a [`TopicStoreHandle`], so topic reports keep flowing in
//! while a save sequence waits for them.

pub mod handle;
pub mod store;

pub use handle::{TopicSnapshot, TopicStoreHandle};
pub use store::{SaveStart, TopicStore, TopicStoreState};
