//! The `error` module defines the error types used within the `statusbot`
//! application.
//!
//! Each enum covers one failure domain so callers (and tests) can tell an
//! authorization problem from a topic save timeout or a failing publisher.
//! Authorization rejections are not errors at all; see
//! [`crate::bot::authorizer::Rejection`].

use std::time::Duration;

use thiserror::Error;

/// Configuration could not be loaded or is missing a required value.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}

/// Failures of the IRC connection itself.
#[derive(Debug, Error)]
pub enum IrcError {
    #[error("irc i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("irc connection closed")]
    Closed,
}

/// Failures of the topic save/restore sequences.
#[derive(Debug, Error)]
pub enum TopicError {
    /// Not every channel reported its topic before the save window closed.
    #[error("timed out saving topics; no report from {missing:?}")]
    Timeout { missing: Vec<String> },

    /// A save or restore sequence is already in progress.
    #[error("topic store busy ({0})")]
    Busy(&'static str),

    #[error("topic store is no longer running")]
    Closed,
}

/// A single publisher failed to handle an event.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("wiki api error: {0}")]
    Wiki(String),

    #[error("journal error: {0}")]
    Journal(#[from] sled::Error),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("panicked: {0}")]
    Panicked(String),
}

impl PublishError {
    /// Returns a short stable label for log fields.
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishError::Http(_) => "http",
            PublishError::Io(_) => "io",
            PublishError::Json(_) => "json",
            PublishError::Wiki(_) => "wiki",
            PublishError::Journal(_) => "journal",
            PublishError::TimedOut(_) => "timed_out",
            PublishError::Panicked(_) => "panicked",
        }
    }
}

/// Anything that can abort the handling of one command.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Irc(#[from] IrcError),

    #[error(transparent)]
    Topic(#[from] TopicError),
}

/// Top-level failures that stop the bot.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Irc(#[from] IrcError),

    #[error("failed to open journal: {0}")]
    Journal(#[from] sled::Error),

    #[error("failed to set up publisher {0}: {1}")]
    Publisher(&'static str, #[source] PublishError),
}
