mod settings;

use std::path::Path;

use config::{Config, Environment, File};
use tracing::warn;

use crate::config::settings::{
    PartialMicroblogSettings, PartialSettings, PartialWikiSettings,
};
use crate::utils::error::SettingsError;

pub use settings::{
    AlertFileSettings, IrcSettings, JournalSettings, LoggingSettings, MicroblogSettings, Settings,
    TimingSettings, WikiSettings,
};

/// Loads the configuration from `path` (or `config/default` when none is
/// given) and `STATUSBOT__SECTION__KEY` environment variables.
/// Merges the configuration with default values and validates the result.
pub fn load_config(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let builder = match path {
        Some(path) => Config::builder().add_source(File::from(path)),
        None => Config::builder().add_source(File::with_name("config/default").required(false)),
    };
    let builder = builder.add_source(
        Environment::with_prefix("STATUSBOT")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("irc.channels")
            .with_list_parse_key("irc.nicks")
            .try_parsing(true),
    );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    let settings = merge(partial);
    settings.validate()?;
    Ok(settings)
}

/// Merges partial settings over `Settings::default()`.
pub(crate) fn merge(partial: PartialSettings) -> Settings {
    let default = Settings::default();
    let irc = partial.irc.unwrap_or_default();
    let timing = partial.timing.unwrap_or_default();
    let logging = partial.logging.unwrap_or_default();

    Settings {
        irc: IrcSettings {
            server: irc.server.unwrap_or(default.irc.server),
            port: irc.port.unwrap_or(default.irc.port),
            nick: irc.nick.unwrap_or(default.irc.nick),
            password: irc.password.unwrap_or(default.irc.password),
            channels: irc
                .channels
                .unwrap_or(default.irc.channels)
                .iter()
                .filter_map(|name| normalize_channel(name))
                .collect(),
            nicks: irc
                .nicks
                .unwrap_or(default.irc.nicks)
                .into_iter()
                .map(|nick| nick.trim().to_string())
                .filter(|nick| !nick.is_empty())
                .collect(),
            trigger: irc.trigger.unwrap_or(default.irc.trigger),
            use_chanserv: irc.use_chanserv.unwrap_or(default.irc.use_chanserv),
        },
        timing: TimingSettings {
            save_timeout_ms: timing
                .save_timeout_ms
                .unwrap_or(default.timing.save_timeout_ms),
            poll_interval_ms: timing
                .poll_interval_ms
                .unwrap_or(default.timing.poll_interval_ms),
            send_delay_ms: timing
                .send_delay_ms
                .unwrap_or(default.timing.send_delay_ms),
            publish_timeout_ms: timing
                .publish_timeout_ms
                .unwrap_or(default.timing.publish_timeout_ms),
            nick_recovery_delay_ms: timing
                .nick_recovery_delay_ms
                .unwrap_or(default.timing.nick_recovery_delay_ms),
        },
        logging: LoggingSettings {
            level: logging.level.unwrap_or(default.logging.level),
        },
        wiki: partial.wiki.and_then(resolve_wiki),
        alertfile: partial
            .alertfile
            .and_then(|a| a.dir)
            .map(|dir| AlertFileSettings { dir }),
        microblog: partial.microblog.and_then(resolve_microblog),
        journal: partial
            .journal
            .and_then(|j| j.path)
            .map(|path| JournalSettings { path }),
    }
}

impl Settings {
    /// Checks the values the bot cannot run without.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.irc.server.trim().is_empty() {
            return Err(SettingsError::Missing("irc.server"));
        }
        if self.irc.nick.trim().is_empty() {
            return Err(SettingsError::Missing("irc.nick"));
        }
        if self.irc.channels.is_empty() {
            return Err(SettingsError::Missing("irc.channels"));
        }
        if self.irc.trigger.trim().is_empty() {
            return Err(SettingsError::Missing("irc.trigger"));
        }
        Ok(())
    }
}

/// Adds the `#` prefix to a bare channel name; blank names are dropped.
pub fn normalize_channel(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        None
    } else if name.starts_with('#') || name.starts_with('&') {
        Some(name.to_string())
    } else {
        Some(format!("#{name}"))
    }
}

fn resolve_wiki(partial: PartialWikiSettings) -> Option<WikiSettings> {
    match (partial.url, partial.username, partial.password, partial.pageid) {
        (Some(url), Some(username), Some(password), Some(pageid)) => Some(WikiSettings {
            url,
            username,
            password,
            pageid,
            success_pageid: partial.success_pageid,
            thanks_pageid: partial.thanks_pageid,
        }),
        _ => {
            warn!("wiki section is incomplete (url, username, password, pageid); wiki disabled");
            None
        }
    }
}

fn resolve_microblog(partial: PartialMicroblogSettings) -> Option<MicroblogSettings> {
    match (partial.url, partial.token) {
        (Some(url), Some(token)) => Some(MicroblogSettings {
            url,
            token,
            post_logs: partial.post_logs.unwrap_or(false),
        }),
        _ => {
            warn!("microblog section is incomplete (url, token); microblog disabled");
            None
        }
    }
}

#[cfg(test)]
mod tests;
