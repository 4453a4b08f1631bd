//! Command parsing.
//!
//! A command line is `<trigger> <verb> [free text...]`. The free text is
//! re-joined with single spaces. A missing or unrecognised verb parses as
//! [`Verb::Unknown`] rather than failing.

use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Alert,
    Notice,
    Log,
    Ok,
    Success,
    Thanks,
    Unknown(String),
}

impl Verb {
    pub fn parse(word: &str) -> Self {
        match word.to_lowercase().as_str() {
            "alert" => Verb::Alert,
            "notice" => Verb::Notice,
            "log" => Verb::Log,
            "ok" => Verb::Ok,
            "success" => Verb::Success,
            "thanks" => Verb::Thanks,
            other => Verb::Unknown(other.to_string()),
        }
    }

    /// Whether the sender must be in the trusted nick set.
    pub fn is_privileged(&self) -> bool {
        !matches!(self, Verb::Success | Verb::Thanks)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verb::Alert => "alert",
            Verb::Notice => "notice",
            Verb::Log => "log",
            Verb::Ok => "ok",
            Verb::Success => "success",
            Verb::Thanks => "thanks",
            Verb::Unknown(word) => word,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed command. `channel` is where replies go: the channel it was
/// said in, or the sender's nick for a private message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: Uuid,
    pub verb: Verb,
    pub channel: String,
    pub nick: String,
    pub text: String,
}

impl Command {
    /// Parses `body` if its first word is exactly `trigger`.
    pub fn parse(trigger: &str, body: &str, nick: &str, channel: &str) -> Option<Self> {
        let mut words = body.split_whitespace();
        if words.next()? != trigger {
            return None;
        }
        let verb = Verb::parse(words.next().unwrap_or_default());
        let text = words.collect::<Vec<_>>().join(" ");

        Some(Self {
            id: Uuid::new_v4(),
            verb,
            channel: channel.to_string(),
            nick: nick.to_string(),
            text,
        })
    }
}
