//! Command authorization.
//!
//! Decides whether a channel or private message is a command the bot should
//! act on. Checks run in this order:
//! 1. identify-msg must have been acknowledged for this session
//! 2. the message must start with the trigger (silently ignored otherwise)
//! 3. the sender must be identified to services (`+` marker)
//! 4. privileged verbs require a trusted nick; `success`/`thanks` do not
//!
//! A rejection never produces a reply to the channel.

use std::collections::HashSet;
use std::fmt;

use crate::bot::command::Command;
use crate::bot::session::SessionState;

/// An admitted command, split by privilege level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Privileged(Command),
    Unprivileged(Command),
}

impl Admission {
    pub fn command(&self) -> &Command {
        match self {
            Admission::Privileged(command) | Admission::Unprivileged(command) => command,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    CapabilityNotNegotiated,
    MissingTrigger,
    Unauthenticated,
    Untrusted,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rejection::CapabilityNotNegotiated => "identify-msg capability not enabled",
            Rejection::MissingTrigger => "not a command",
            Rejection::Unauthenticated => "sender not identified",
            Rejection::Untrusted => "sender not trusted",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Authorizer {
    trigger: String,
    trusted: HashSet<String>,
}

impl Authorizer {
    pub fn new(trigger: &str, trusted: &[String]) -> Self {
        Self {
            trigger: trigger.to_string(),
            trusted: trusted.iter().cloned().collect(),
        }
    }

    pub fn admit(
        &self,
        session: SessionState,
        nick: &str,
        target: &str,
        text: &str,
    ) -> Result<Admission, Rejection> {
        if session != SessionState::Ready {
            return Err(Rejection::CapabilityNotNegotiated);
        }

        // identify-msg prefixes every message with + (identified) or -.
        let (identified, body) = match text.chars().next() {
            Some('+') => (true, &text[1..]),
            Some('-') => (false, &text[1..]),
            _ => (false, text),
        };

        let reply_to = if target.starts_with(['#', '&']) {
            target
        } else {
            nick
        };
        let command =
            Command::parse(&self.trigger, body, nick, reply_to).ok_or(Rejection::MissingTrigger)?;

        if !identified {
            return Err(Rejection::Unauthenticated);
        }
        if !command.verb.is_privileged() {
            return Ok(Admission::Unprivileged(command));
        }
        if !self.trusted.contains(nick) {
            return Err(Rejection::Untrusted);
        }
        Ok(Admission::Privileged(command))
    }
}
