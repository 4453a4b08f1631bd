//! MediaWiki action API client.
//!
//! Uses a cookie-backed `reqwest` client so the session created by
//! `login` carries over to the edit. Flow per update:
//! login token -> `action=login` -> revision content -> csrf token -> `action=edit`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::WikiSettings;
use crate::publisher::wiki::WikiApi;
use crate::utils::error::PublishError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct MediaWikiClient {
    http: reqwest::Client,
    url: String,
    username: String,
    password: String,
}

impl MediaWikiClient {
    pub fn new(settings: &WikiSettings) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("statusbot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            url: settings.url.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    async fn get(&self, query: &[(&str, &str)]) -> Result<Value, PublishError> {
        let body: Value = self
            .http
            .get(&self.url)
            .query(query)
            .query(&[("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_api_error(body)
    }

    async fn post(&self, form: &[(&str, &str)]) -> Result<Value, PublishError> {
        let mut fields = form.to_vec();
        fields.push(("format", "json"));
        let body: Value = self
            .http
            .post(&self.url)
            .form(&fields)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_api_error(body)
    }

    async fn token(&self, kind: &str) -> Result<String, PublishError> {
        let body = self
            .get(&[("action", "query"), ("meta", "tokens"), ("type", kind)])
            .await?;
        body["query"]["tokens"][format!("{kind}token")]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PublishError::Wiki(format!("no {kind} token in response")))
    }
}

#[async_trait]
impl WikiApi for MediaWikiClient {
    async fn login(&self) -> Result<(), PublishError> {
        let token = self.token("login").await?;
        let body = self
            .post(&[
                ("action", "login"),
                ("lgname", self.username.as_str()),
                ("lgpassword", self.password.as_str()),
                ("lgtoken", token.as_str()),
            ])
            .await?;

        match body["login"]["result"].as_str() {
            Some("Success") => {
                debug!("Logged in to wiki as {}", self.username);
                Ok(())
            }
            other => Err(PublishError::Wiki(format!(
                "login failed: {}",
                other.unwrap_or("no result")
            ))),
        }
    }

    async fn fetch(&self, pageid: u64) -> Result<String, PublishError> {
        let pageid = pageid.to_string();
        let body = self
            .get(&[
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("pageids", pageid.as_str()),
            ])
            .await?;
        revision_content(&body, &pageid)
    }

    async fn store(&self, pageid: u64, text: &str) -> Result<(), PublishError> {
        let token = self.token("csrf").await?;
        let pageid = pageid.to_string();
        let body = self
            .post(&[
                ("action", "edit"),
                ("pageid", pageid.as_str()),
                ("bot", "1"),
                ("text", text),
                ("token", token.as_str()),
            ])
            .await?;

        match body["edit"]["result"].as_str() {
            Some("Success") => Ok(()),
            other => Err(PublishError::Wiki(format!(
                "edit failed: {}",
                other.unwrap_or("no result")
            ))),
        }
    }
}

/// Latest revision text of `pageid`.
///
/// Accepts both the legacy `revisions[0]["*"]` layout and the slot layout
/// `revisions[0].slots.main["*"]`. A missing body is an error, never an
/// empty page.
pub(crate) fn revision_content(body: &Value, pageid: &str) -> Result<String, PublishError> {
    let revision = &body["query"]["pages"][pageid]["revisions"][0];
    revision["*"]
        .as_str()
        .or_else(|| revision["slots"]["main"]["*"].as_str())
        .map(str::to_string)
        .ok_or_else(|| PublishError::Wiki(format!("no revision content for page {pageid}")))
}

fn check_api_error(body: Value) -> Result<Value, PublishError> {
    match body.get("error") {
        Some(error) => Err(PublishError::Wiki(
            error["info"].as_str().unwrap_or("unknown error").to_string(),
        )),
        None => Ok(body),
    }
}
