//! The `persistence` module records the unprivileged `success` and `thanks`
//! reports.
//!
//! Each report is a [`LogEntry`]. Sinks implement [`EntryLog`]; the local
//! sink is a `sled` journal with one tree per entry kind, and the wiki
//! publisher provides an optional page-backed sink.

pub mod sled_store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::PublishError;

pub use sled_store::Journal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Success,
    Thanks,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Success => "success",
            EntryKind::Thanks => "thanks",
        }
    }
}

/// One timestamped report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: EntryKind,
    pub nick: String,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl LogEntry {
    pub fn now(kind: EntryKind, nick: &str, text: &str) -> Self {
        Self {
            kind,
            nick: nick.to_string(),
            text: text.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// A sink for success/thanks entries.
#[async_trait]
pub trait EntryLog: Send + Sync {
    fn name(&self) -> &str;

    async fn record(&self, entry: &LogEntry) -> Result<(), PublishError>;
}

/// Sinks registered per entry kind, invoked in registration order.
#[derive(Clone, Default)]
pub struct EntryLogs {
    pub success: Vec<Arc<dyn EntryLog>>,
    pub thanks: Vec<Arc<dyn EntryLog>>,
}

impl EntryLogs {
    pub fn for_kind(&self, kind: EntryKind) -> &[Arc<dyn EntryLog>] {
        match kind {
            EntryKind::Success => &self.success,
            EntryKind::Thanks => &self.thanks,
        }
    }

    /// Registers a sink for both kinds.
    pub fn register_all(&mut self, sink: Arc<dyn EntryLog>) {
        self.success.push(Arc::clone(&sink));
        self.thanks.push(sink);
    }
}

#[cfg(test)]
mod tests;
