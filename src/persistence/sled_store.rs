//! Journal backed by `sled`
//!
//! Entries are stored per kind in a `sled` tree. Each key is prefixed with
//! the entry timestamp so iteration yields entries in chronological order;
//! a UUID suffix keeps entries recorded in the same millisecond apart.

use std::path::Path;

use async_trait::async_trait;
use sled::Db;
use tracing::debug;
use uuid::Uuid;

use crate::persistence::{EntryKind, EntryLog, LogEntry};
use crate::utils::error::PublishError;

#[derive(Clone)]
pub struct Journal {
    db: Db,
}

impl Journal {
    /// Open or create a sled database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, sled::Error> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    pub fn append(&self, entry: &LogEntry) -> Result<(), PublishError> {
        let serialized = serde_json::to_vec(entry)?;
        let tree = self.db.open_tree(entry.kind.as_str())?;
        let key = format!("{:020}_{}", entry.timestamp, Uuid::new_v4());

        tree.insert(key.as_bytes(), serialized)?;
        tree.flush()?;
        debug!("Journaled {} from {}", entry.kind.as_str(), entry.nick);
        Ok(())
    }

    /// All entries of one kind, oldest first. Undecodable values are skipped.
    pub fn entries(&self, kind: EntryKind) -> Result<Vec<LogEntry>, PublishError> {
        let tree = self.db.open_tree(kind.as_str())?;
        Ok(tree
            .iter()
            .filter_map(|res| res.ok())
            .filter_map(|(_, val)| serde_json::from_slice(&val).ok())
            .collect())
    }
}

#[async_trait]
impl EntryLog for Journal {
    fn name(&self) -> &str {
        "journal"
    }

    async fn record(&self, entry: &LogEntry) -> Result<(), PublishError> {
        self.append(entry)
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal").field("db", &"sled::Db").finish()
    }
}
