//! Wiki status page.
//!
//! The page body is a small line-oriented markup:
//!
//! ```text
//! {{CI Alert|Gerrit is down}}
//!
//! * 2024-05-01 10:02:00 UTC Gerrit is down
//! * 2024-04-30 08:00:00 UTC upgraded zuul
//! ```
//!
//! The alert marker comes first when present, then a blank line, then the
//! log items newest first. Every update loads the page, changes it, and
//! saves it back so edits made by hand in between are kept.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::persistence::{EntryLog, LogEntry};
use crate::publisher::Publisher;
use crate::utils::error::PublishError;

const ALERT_OPEN: &str = "{{CI Alert|";
const ALERT_CLOSE: &str = "}}";
const ITEM_PREFIX: &str = "* ";

/// Parsed status page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WikiPage {
    pub alert: Option<String>,
    pub items: Vec<String>,
}

impl WikiPage {
    /// Parses a page body. Lines that are neither the alert marker nor an
    /// item are dropped.
    pub fn load_items(text: &str) -> Self {
        let mut page = WikiPage::default();
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix(ALERT_OPEN) {
                if let Some(end) = rest.find(ALERT_CLOSE) {
                    page.alert = Some(rest[..end].to_string());
                }
            }
            if let Some(item) = line.strip_prefix(ITEM_PREFIX) {
                page.items.push(item.to_string());
            }
        }
        page
    }

    /// Renders the page body.
    pub fn save_items(&self) -> String {
        let mut text = String::new();
        if let Some(alert) = self.alert.as_deref().filter(|a| !a.is_empty()) {
            text.push_str(&format!("{ALERT_OPEN}{alert}{ALERT_CLOSE}\n\n"));
        }
        for item in &self.items {
            text.push_str(&format!("{ITEM_PREFIX}{item}\n"));
        }
        text
    }

    /// Prepends a timestamped item.
    pub fn add_item(&mut self, item: &str, ts: DateTime<Utc>) {
        self.items
            .insert(0, format!("{} {item}", ts.format("%Y-%m-%d %H:%M:%S UTC")));
    }

    pub fn set_alert(&mut self, alert: Option<&str>) {
        self.alert = alert.map(str::to_string);
    }

    /// Item texts with their timestamp prefix removed.
    pub fn messages(&self) -> Vec<&str> {
        self.items
            .iter()
            .map(|item| match item.split_once(" UTC ") {
                Some((ts, msg))
                    if NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").is_ok() =>
                {
                    msg
                }
                _ => item.as_str(),
            })
            .collect()
    }
}

/// The wiki operations the publishers need.
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// Establishes a session. Called before every update.
    async fn login(&self) -> Result<(), PublishError> {
        Ok(())
    }

    /// Current body of the page.
    async fn fetch(&self, pageid: u64) -> Result<String, PublishError>;

    /// Replaces the body of the page.
    async fn store(&self, pageid: u64, text: &str) -> Result<(), PublishError>;
}

enum AlertChange {
    Keep,
    Set,
    Clear,
}

pub struct WikiStatusPublisher {
    api: Arc<dyn WikiApi>,
    pageid: u64,
}

impl WikiStatusPublisher {
    pub fn new(api: Arc<dyn WikiApi>, pageid: u64) -> Self {
        Self { api, pageid }
    }

    async fn update(&self, change: AlertChange, msg: Option<&str>) -> Result<(), PublishError> {
        self.api.login().await?;
        let mut page = WikiPage::load_items(&self.api.fetch(self.pageid).await?);

        match change {
            AlertChange::Keep => {}
            AlertChange::Set => page.set_alert(msg),
            AlertChange::Clear => page.set_alert(None),
        }
        if let Some(msg) = msg.filter(|m| !m.is_empty()) {
            page.add_item(msg, Utc::now());
        }

        self.api.store(self.pageid, &page.save_items()).await
    }
}

#[async_trait]
impl Publisher for WikiStatusPublisher {
    fn name(&self) -> &str {
        "wiki"
    }

    async fn alert(&self, text: &str) -> Result<(), PublishError> {
        self.update(AlertChange::Set, Some(text)).await
    }

    async fn notice(&self, text: &str) -> Result<(), PublishError> {
        self.update(AlertChange::Keep, Some(text)).await
    }

    async fn log(&self, text: &str) -> Result<(), PublishError> {
        self.update(AlertChange::Keep, Some(text)).await
    }

    async fn ok(&self, text: Option<&str>) -> Result<(), PublishError> {
        self.update(AlertChange::Clear, text).await
    }
}

/// A wiki page collecting success or thanks entries, newest first.
pub struct WikiEntryPage {
    api: Arc<dyn WikiApi>,
    pageid: u64,
    name: String,
}

impl WikiEntryPage {
    pub fn new(api: Arc<dyn WikiApi>, pageid: u64, name: &str) -> Self {
        Self {
            api,
            pageid,
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl EntryLog for WikiEntryPage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn record(&self, entry: &LogEntry) -> Result<(), PublishError> {
        self.api.login().await?;
        let mut page = WikiPage::load_items(&self.api.fetch(self.pageid).await?);
        let ts = DateTime::<Utc>::from_timestamp_millis(entry.timestamp).unwrap_or_else(Utc::now);
        page.add_item(&format!("{}: {}", entry.nick, entry.text), ts);
        self.api.store(self.pageid, &page.save_items()).await
    }
}
