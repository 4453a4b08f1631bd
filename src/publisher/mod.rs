//! Publishers
//!
//! A publisher is an external sink that mirrors the bot's announcements:
//! the wiki status page, the local alert file, the microblog feed. Every
//! publisher implements the four [`Publisher`] operations; the ones that do
//! not care about an operation keep the default no-op.
//!
//! [`PublisherSet`] fans one [`PublishEvent`] out to every registered
//! publisher, strictly in registration order. Each call is bounded by a
//! timeout and isolated with `catch_unwind`, so a failing, hanging or
//! panicking publisher never stops the ones after it.

pub mod alert_file;
pub mod mediawiki;
pub mod microblog;
pub mod wiki;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::utils::error::PublishError;

pub use alert_file::{AlertFilePublisher, AlertRecord};
pub use mediawiki::MediaWikiClient;
pub use microblog::{HttpMicroblogClient, MicroblogClient, MicroblogPublisher, split_message};
pub use wiki::{WikiApi, WikiEntryPage, WikiPage, WikiStatusPublisher};

/// Capability interface of a status sink.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// An alert was raised (or replaced).
    async fn alert(&self, _text: &str) -> Result<(), PublishError> {
        Ok(())
    }

    /// A transient announcement.
    async fn notice(&self, _text: &str) -> Result<(), PublishError> {
        Ok(())
    }

    /// An audit entry that does not change the alert state.
    async fn log(&self, _text: &str) -> Result<(), PublishError> {
        Ok(())
    }

    /// The alert was cleared, optionally with a closing note.
    async fn ok(&self, _text: Option<&str>) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Publisher that accepts everything and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

#[async_trait]
impl Publisher for NullPublisher {
    fn name(&self) -> &str {
        "null"
    }
}

/// One event to fan out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    Alert(String),
    Notice(String),
    Log(String),
    Ok(Option<String>),
}

impl PublishEvent {
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishEvent::Alert(_) => "alert",
            PublishEvent::Notice(_) => "notice",
            PublishEvent::Log(_) => "log",
            PublishEvent::Ok(_) => "ok",
        }
    }
}

/// A publisher that failed on one event.
#[derive(Debug)]
pub struct PublisherFailure {
    pub publisher: String,
    pub error: PublishError,
}

/// Ordered publisher registration list.
#[derive(Clone)]
pub struct PublisherSet {
    publishers: Vec<Arc<dyn Publisher>>,
    timeout: Duration,
}

impl PublisherSet {
    pub fn new(publishers: Vec<Arc<dyn Publisher>>, timeout: Duration) -> Self {
        Self {
            publishers,
            timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.publishers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Delivers `event` to every publisher in registration order and returns
    /// the failures. Failures are logged here and never abort the loop.
    pub async fn fan_out(&self, event: &PublishEvent) -> Vec<PublisherFailure> {
        let mut failures = Vec::new();

        for publisher in &self.publishers {
            let delivery = tokio::time::timeout(self.timeout, deliver(publisher.as_ref(), event));
            let result = match AssertUnwindSafe(delivery).catch_unwind().await {
                Ok(Ok(result)) => result,
                Ok(Err(_elapsed)) => Err(PublishError::TimedOut(self.timeout)),
                Err(panic) => Err(PublishError::Panicked(panic_message(panic.as_ref()))),
            };

            match result {
                Ok(()) => debug!("Publisher {} handled {}", publisher.name(), event.as_label()),
                Err(error) => {
                    warn!(
                        publisher = publisher.name(),
                        event = event.as_label(),
                        kind = error.as_label(),
                        "Publisher failed: {error}"
                    );
                    failures.push(PublisherFailure {
                        publisher: publisher.name().to_string(),
                        error,
                    });
                }
            }
        }

        failures
    }
}

async fn deliver(publisher: &dyn Publisher, event: &PublishEvent) -> Result<(), PublishError> {
    match event {
        PublishEvent::Alert(text) => publisher.alert(text).await,
        PublishEvent::Notice(text) => publisher.notice(text).await,
        PublishEvent::Log(text) => publisher.log(text).await,
        PublishEvent::Ok(text) => publisher.ok(text.as_deref()).await,
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
