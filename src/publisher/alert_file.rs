//! Local alert file.
//!
//! Holds a single JSON object, `{"alert": "text"}` while an alert is active
//! and `{"alert": null}` otherwise. Writes go to a temporary file in the
//! same directory which is then renamed over `alert.json`, so readers never
//! see a partial file.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::publisher::Publisher;
use crate::utils::error::PublishError;

const FILE_NAME: &str = "alert.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert: Option<String>,
}

#[derive(Debug)]
pub struct AlertFilePublisher {
    dir: PathBuf,
    path: PathBuf,
}

impl AlertFilePublisher {
    /// Creates the publisher and clears any alert left by a previous run.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, PublishError> {
        let dir = dir.as_ref().to_path_buf();
        let publisher = Self {
            path: dir.join(FILE_NAME),
            dir,
        };
        publisher.write(None)?;
        Ok(publisher)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, alert: Option<&str>) -> Result<(), PublishError> {
        let record = AlertRecord {
            alert: alert.map(str::to_string),
        };
        let mut file = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut file, &record)?;
        file.flush()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl Publisher for AlertFilePublisher {
    fn name(&self) -> &str {
        "alertfile"
    }

    async fn alert(&self, text: &str) -> Result<(), PublishError> {
        self.write(Some(text))
    }

    async fn ok(&self, _text: Option<&str>) -> Result<(), PublishError> {
        self.write(None)
    }
}
