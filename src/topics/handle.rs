//! Actor wrapper around [`TopicStore`].
//!
//! Requests are queued on an unbounded channel and answered over oneshot
//! channels. `save_all` and `restore_plan` implement the multi-step
//! sequences on top of those requests; they are only ever driven by the
//! dispatcher, which handles one command at a time.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info};

use crate::config::TimingSettings;
use crate::topics::store::{SaveStart, TopicStore, TopicStoreState};
use crate::transport::IrcHandle;
use crate::utils::error::{DispatchError, TopicError};

/// Point-in-time copy of the store, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSnapshot {
    pub state: TopicStoreState,
    pub cache: HashMap<String, String>,
}

enum TopicRequest {
    Observe { channel: String, topic: String },
    BeginSave(oneshot::Sender<Result<SaveStart, TopicError>>),
    Missing(oneshot::Sender<Vec<String>>),
    FinishSave(oneshot::Sender<Result<(), TopicError>>),
    BeginRestore(oneshot::Sender<Result<Vec<(String, String)>, TopicError>>),
    FinishRestore,
    Snapshot(oneshot::Sender<TopicSnapshot>),
}

#[derive(Debug, Clone)]
pub struct TopicStoreHandle {
    sender: mpsc::UnboundedSender<TopicRequest>,
}

impl TopicStoreHandle {
    /// Spawns the actor owning a fresh store for `channels`.
    pub fn spawn(channels: Vec<String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run(TopicStore::new(channels), receiver));
        Self { sender }
    }

    /// Forwards a topic report from the event loop. Never waits.
    pub fn observe(&self, channel: &str, topic: &str) {
        let request = TopicRequest::Observe {
            channel: channel.to_string(),
            topic: topic.to_string(),
        };
        if self.sender.send(request).is_err() {
            error!("Topic store stopped; dropping topic report for {channel}");
        }
    }

    pub async fn snapshot(&self) -> Result<TopicSnapshot, TopicError> {
        self.request(TopicRequest::Snapshot).await
    }

    /// Saves the current topic of every channel unless a snapshot is
    /// already held.
    ///
    /// Queries each channel, then polls until every channel has reported or
    /// `save_timeout` elapses. On timeout the partial snapshot is dropped and
    /// `TopicError::Timeout` is returned.
    pub async fn save_all(
        &self,
        irc: &IrcHandle,
        channels: &[String],
        timing: &TimingSettings,
    ) -> Result<SaveStart, DispatchError> {
        if self.request(TopicRequest::BeginSave).await?? == SaveStart::AlreadySaved {
            debug!("Keeping topics saved by an earlier alert");
            return Ok(SaveStart::AlreadySaved);
        }

        for channel in channels {
            if let Err(e) = irc.query_topic(channel) {
                // Leave recording mode before giving up.
                let _ = self.request(TopicRequest::FinishSave).await;
                return Err(e.into());
            }
            sleep(timing.send_delay()).await;
        }

        let deadline = Instant::now() + timing.save_timeout();
        loop {
            let missing = self.request(TopicRequest::Missing).await?;
            if missing.is_empty() || Instant::now() >= deadline {
                break;
            }
            sleep(timing.poll_interval()).await;
        }

        self.request(TopicRequest::FinishSave).await??;
        info!("Saved topics for {} channels", channels.len());
        Ok(SaveStart::Started)
    }

    /// Starts a restore: returns the topic to put back on each channel.
    /// Must be followed by [`finish_restore`](Self::finish_restore).
    pub async fn restore_plan(&self) -> Result<Vec<(String, String)>, TopicError> {
        self.request(TopicRequest::BeginRestore).await?
    }

    pub fn finish_restore(&self) {
        if self.sender.send(TopicRequest::FinishRestore).is_err() {
            error!("Topic store stopped before the restore finished");
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> TopicRequest,
    ) -> Result<T, TopicError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make(reply))
            .map_err(|_| TopicError::Closed)?;
        response.await.map_err(|_| TopicError::Closed)
    }
}

async fn run(mut store: TopicStore, mut requests: mpsc::UnboundedReceiver<TopicRequest>) {
    while let Some(request) = requests.recv().await {
        match request {
            TopicRequest::Observe { channel, topic } => {
                if store.observe(&channel, &topic) {
                    debug!("Recorded topic for {channel}");
                }
            }
            TopicRequest::BeginSave(reply) => {
                let _ = reply.send(store.begin_save());
            }
            TopicRequest::Missing(reply) => {
                let _ = reply.send(store.missing());
            }
            TopicRequest::FinishSave(reply) => {
                let _ = reply.send(store.finish_save());
            }
            TopicRequest::BeginRestore(reply) => {
                let _ = reply.send(store.begin_restore());
            }
            TopicRequest::FinishRestore => store.finish_restore(),
            TopicRequest::Snapshot(reply) => {
                let _ = reply.send(TopicSnapshot {
                    state: store.state(),
                    cache: store.cache().clone(),
                });
            }
        }
    }
    debug!("Topic store stopped");
}
