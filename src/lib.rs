//! # statusbot
//!
//! `statusbot` is an IRC bot that relays status announcements from trusted
//! operators to every channel it sits in and mirrors them to external
//! status surfaces.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `bot`: The command pipeline: session negotiation, authorization, dispatch and broadcast.
//! - `config`: Handles loading and validating the bot configuration.
//! - `persistence`: Records success and thanks reports (using a `sled` journal).
//! - `publisher`: External status sinks (wiki page, alert file, microblog) and their fan-out.
//! - `topics`: Saves channel topics before an alert and restores them afterwards.
//! - `transport`: Manages the IRC connection and line protocol.
//! - `utils`: Contains shared utilities, such as error handling and logging.

pub mod bot;
pub mod config;
pub mod persistence;
pub mod publisher;
pub mod topics;
pub mod transport;
pub mod utils;
