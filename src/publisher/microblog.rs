//! Microblog feed.
//!
//! Posts longer than the character budget are split into numbered parts,
//! `0/...`, `1/...`, and so on. A message that fits is posted as is.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::MicroblogSettings;
use crate::publisher::Publisher;
use crate::utils::error::PublishError;

/// Characters per post, before the part number.
pub const POST_BUDGET: usize = 120;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Splits `text` into posts of at most `budget` characters each.
pub fn split_message(text: &str, budget: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let chunks: Vec<String> = chars
        .chunks(budget.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect();

    if chunks.len() <= 1 {
        return chunks;
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| format!("{index}/{chunk}"))
        .collect()
}

#[async_trait]
pub trait MicroblogClient: Send + Sync {
    async fn post(&self, status: &str) -> Result<(), PublishError>;
}

/// Posts statuses to a Mastodon-compatible `/api/v1/statuses` endpoint.
pub struct HttpMicroblogClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpMicroblogClient {
    pub fn new(settings: &MicroblogSettings) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/v1/statuses", settings.url.trim_end_matches('/')),
            token: settings.token.clone(),
        })
    }
}

#[async_trait]
impl MicroblogClient for HttpMicroblogClient {
    async fn post(&self, status: &str) -> Result<(), PublishError> {
        self.http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .form(&[("status", status)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub struct MicroblogPublisher {
    client: Arc<dyn MicroblogClient>,
    post_logs: bool,
}

impl MicroblogPublisher {
    pub fn new(client: Arc<dyn MicroblogClient>, post_logs: bool) -> Self {
        Self { client, post_logs }
    }

    async fn update(&self, text: &str) -> Result<(), PublishError> {
        for part in split_message(text, POST_BUDGET) {
            self.client.post(&part).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for MicroblogPublisher {
    fn name(&self) -> &str {
        "microblog"
    }

    async fn alert(&self, text: &str) -> Result<(), PublishError> {
        self.update(text).await
    }

    async fn notice(&self, text: &str) -> Result<(), PublishError> {
        self.update(text).await
    }

    async fn log(&self, text: &str) -> Result<(), PublishError> {
        if self.post_logs {
            self.update(text).await
        } else {
            Ok(())
        }
    }

    async fn ok(&self, text: Option<&str>) -> Result<(), PublishError> {
        match text {
            Some(text) => self.update(text).await,
            None => Ok(()),
        }
    }
}
