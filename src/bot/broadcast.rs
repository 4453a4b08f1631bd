//! Broadcast protocol.
//!
//! Sends notices and topic changes to every channel, pausing for the
//! configured send delay after each outbound action so the server's flood
//! limits are never hit.

use std::time::Duration;

use tokio::time::sleep;

use crate::transport::IrcHandle;
use crate::utils::error::IrcError;

const CHANSERV: &str = "ChanServ";

/// What to do on each channel besides sending the notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct BroadcastOptions<'a> {
    /// Set the topic to the broadcast text.
    pub set_topic: bool,
    /// Put these `(channel, topic)` pairs back before the notice.
    pub restore: Option<&'a [(String, String)]>,
}

#[derive(Debug, Clone)]
pub struct Broadcaster {
    irc: IrcHandle,
    channels: Vec<String>,
    delay: Duration,
    use_chanserv: bool,
}

impl Broadcaster {
    pub fn new(irc: IrcHandle, channels: Vec<String>, delay: Duration, use_chanserv: bool) -> Self {
        Self {
            irc,
            channels,
            delay,
            use_chanserv,
        }
    }

    pub fn irc(&self) -> &IrcHandle {
        &self.irc
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Per channel: restore the saved topic, send `prefix + text` when
    /// `text` is non-empty, then set the topic to `text`, each step only
    /// when requested.
    pub async fn broadcast(
        &self,
        prefix: &str,
        text: &str,
        options: BroadcastOptions<'_>,
    ) -> Result<(), IrcError> {
        for channel in &self.channels {
            if let Some(plan) = options.restore {
                if let Some((_, topic)) = plan.iter().find(|(c, _)| c == channel) {
                    self.set_topic(channel, topic).await?;
                }
            }
            if !text.is_empty() {
                self.send(channel, &format!("{prefix}{text}")).await?;
            }
            if options.set_topic {
                self.set_topic(channel, text).await?;
            }
        }
        Ok(())
    }

    /// Sends one message and waits out the send delay.
    pub async fn send(&self, target: &str, text: &str) -> Result<(), IrcError> {
        self.irc.privmsg(target, text)?;
        sleep(self.delay).await;
        Ok(())
    }

    async fn set_topic(&self, channel: &str, topic: &str) -> Result<(), IrcError> {
        self.irc.set_topic(channel, topic)?;
        sleep(self.delay).await;
        if self.use_chanserv {
            self.irc
                .privmsg(CHANSERV, &format!("topic {channel} {topic}"))?;
            sleep(self.delay).await;
        }
        Ok(())
    }
}
