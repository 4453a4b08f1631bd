//! IRC session state.
//!
//! `transition` is a pure function of (state, event) returning the next
//! state and the actions to perform. [`Session`] holds the current state
//! and logs the interesting transitions.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{IrcSettings, TimingSettings};
use crate::transport::{IrcCommand, IrcEvent};

/// Capability that marks each message with the sender's services status.
pub const IDENTIFY_MSG: &str = "identify-msg";

const NICKSERV: &str = "NickServ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Commands are refused until identify-msg is acknowledged.
    AwaitingCapability,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Send(IrcCommand),
    Pause(Duration),
}

/// Identity the session negotiates with.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub nick: String,
    pub password: String,
    pub channels: Vec<String>,
    pub nick_recovery_delay: Duration,
}

impl SessionConfig {
    pub fn new(irc: &IrcSettings, timing: &TimingSettings) -> Self {
        Self {
            nick: irc.nick.clone(),
            password: irc.password.clone(),
            channels: irc.channels.clone(),
            nick_recovery_delay: timing.nick_recovery_delay(),
        }
    }

    fn nickserv(&self, text: String) -> SessionAction {
        SessionAction::Send(IrcCommand::Privmsg {
            target: NICKSERV.to_string(),
            text,
        })
    }
}

pub fn transition(
    state: SessionState,
    event: &IrcEvent,
    config: &SessionConfig,
) -> (SessionState, Vec<SessionAction>) {
    match event {
        IrcEvent::Welcome => {
            let mut actions = vec![
                SessionAction::Send(IrcCommand::CapReq(IDENTIFY_MSG.to_string())),
                SessionAction::Send(IrcCommand::CapEnd),
            ];
            if !config.password.is_empty() {
                actions.push(config.nickserv(format!("identify {}", config.password)));
            }
            actions.extend(
                config
                    .channels
                    .iter()
                    .map(|channel| SessionAction::Send(IrcCommand::Join(channel.clone()))),
            );
            (SessionState::AwaitingCapability, actions)
        }
        IrcEvent::Cap {
            subcommand,
            capabilities,
        } if subcommand == "ACK" && capabilities.iter().any(|c| c == IDENTIFY_MSG) => {
            (SessionState::Ready, Vec::new())
        }
        IrcEvent::NicknameInUse => {
            let mut actions = vec![SessionAction::Send(IrcCommand::Nick(format!(
                "{}_",
                config.nick
            )))];
            if !config.password.is_empty() {
                actions.push(config.nickserv(format!("identify {}", config.password)));
                actions.push(config.nickserv(format!("ghost {} {}", config.nick, config.password)));
                actions.push(config.nickserv(format!(
                    "release {} {}",
                    config.nick, config.password
                )));
            }
            actions.push(SessionAction::Pause(config.nick_recovery_delay));
            actions.push(SessionAction::Send(IrcCommand::Nick(config.nick.clone())));
            (state, actions)
        }
        _ => (state, Vec::new()),
    }
}

#[derive(Debug)]
pub struct Session {
    state: SessionState,
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: SessionState::AwaitingCapability,
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn on_event(&mut self, event: &IrcEvent) -> Vec<SessionAction> {
        match event {
            IrcEvent::Welcome => {
                debug!("Requesting {IDENTIFY_MSG} capability");
                for channel in &self.config.channels {
                    info!("Joining {channel}");
                }
            }
            IrcEvent::Cap {
                subcommand,
                capabilities,
            } => {
                debug!("Received cap response {subcommand} {capabilities:?}");
                if subcommand == "NAK" {
                    warn!("Server refused capabilities {capabilities:?}; commands stay disabled");
                }
            }
            IrcEvent::NicknameInUse => debug!("Nickname in use, releasing"),
            _ => {}
        }

        let (next, actions) = transition(self.state, event, &self.config);
        if next != self.state {
            debug!("Session {:?} -> {next:?}", self.state);
            self.state = next;
        }
        actions
    }
}
