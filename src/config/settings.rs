use serde::Deserialize;
use std::time::Duration;

/// Top-level configuration settings for the application.
///
/// The IRC, timing and logging sections always have values. The publisher
/// sections are optional: a collaborator whose section is absent or
/// incomplete is simply not registered.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub irc: IrcSettings,
    pub timing: TimingSettings,
    pub logging: LoggingSettings,
    pub wiki: Option<WikiSettings>,
    pub alertfile: Option<AlertFileSettings>,
    pub microblog: Option<MicroblogSettings>,
    pub journal: Option<JournalSettings>,
}

/// Connection, identity and command settings for the IRC session.
#[derive(Debug, Deserialize, Clone)]
pub struct IrcSettings {
    pub server: String,
    pub port: u16,
    pub nick: String,
    /// NickServ password. Empty disables NickServ identification.
    pub password: String,
    /// Channels to join, always `#`-prefixed after loading.
    pub channels: Vec<String>,
    /// Nicks trusted to issue privileged commands.
    pub nicks: Vec<String>,
    pub trigger: String,
    /// Also ask ChanServ to set topics, for channels with a topic lock.
    pub use_chanserv: bool,
}

/// Delays and timeouts, in milliseconds.
///
/// These encode assumptions about server latency and flood limits, so they
/// are configuration rather than constants.
#[derive(Debug, Deserialize, Clone)]
pub struct TimingSettings {
    pub save_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub send_delay_ms: u64,
    pub publish_timeout_ms: u64,
    pub nick_recovery_delay_ms: u64,
}

impl TimingSettings {
    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn nick_recovery_delay(&self) -> Duration {
        Duration::from_millis(self.nick_recovery_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// MediaWiki status page credentials and page ids.
#[derive(Debug, Deserialize, Clone)]
pub struct WikiSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub pageid: u64,
    pub success_pageid: Option<u64>,
    pub thanks_pageid: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertFileSettings {
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MicroblogSettings {
    pub url: String,
    pub token: String,
    pub post_logs: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JournalSettings {
    pub path: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PartialSettings {
    pub irc: Option<PartialIrcSettings>,
    pub timing: Option<PartialTimingSettings>,
    pub logging: Option<PartialLoggingSettings>,
    pub wiki: Option<PartialWikiSettings>,
    pub alertfile: Option<PartialAlertFileSettings>,
    pub microblog: Option<PartialMicroblogSettings>,
    pub journal: Option<PartialJournalSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialIrcSettings {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub nick: Option<String>,
    pub password: Option<String>,
    pub channels: Option<Vec<String>>,
    pub nicks: Option<Vec<String>>,
    pub trigger: Option<String>,
    pub use_chanserv: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialTimingSettings {
    pub save_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub send_delay_ms: Option<u64>,
    pub publish_timeout_ms: Option<u64>,
    pub nick_recovery_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialWikiSettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pageid: Option<u64>,
    pub success_pageid: Option<u64>,
    pub thanks_pageid: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialAlertFileSettings {
    pub dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialMicroblogSettings {
    pub url: Option<String>,
    pub token: Option<String>,
    pub post_logs: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialJournalSettings {
    pub path: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Only the channel list has no usable default; see `Settings::validate`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            irc: IrcSettings {
                server: "localhost".to_string(),
                port: 6667,
                nick: "statusbot".to_string(),
                password: String::new(),
                channels: Vec::new(),
                nicks: Vec::new(),
                trigger: "#status".to_string(),
                use_chanserv: true,
            },
            timing: TimingSettings {
                save_timeout_ms: 300_000,
                poll_interval_ms: 500,
                send_delay_ms: 500,
                publish_timeout_ms: 30_000,
                nick_recovery_delay_ms: 1_000,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
            wiki: None,
            alertfile: None,
            microblog: None,
            journal: None,
        }
    }
}
