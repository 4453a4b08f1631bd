//! The `transport` module is responsible for network communication with the
//! IRC server.
//!
//! It defines the line protocol (parsing inbound lines into [`IrcEvent`]s and
//! encoding outbound [`IrcCommand`]s), the byte-level line codec, and the TCP connection itself: a reader
//! task forwarding events to the bot and a writer task draining the queue
//! behind every [`IrcHandle`].

pub mod codec;
pub mod connection;
pub mod message;

pub use codec::IrcLineCodec;
pub use connection::{IrcHandle, connect};
pub use message::{IrcCommand, IrcEvent, IrcMessage};

#[cfg(test)]
mod tests;
