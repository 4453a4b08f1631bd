//! IRC line protocol.
//!
//! Only the handful of commands and numerics the bot reacts to get their own
//! [`IrcEvent`] variant; everything else is passed through as `Other`.

/// A parsed IRC line: `[@tags] [:prefix] COMMAND params... [:trailing]`.
///
/// Message tags are accepted and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if rest.starts_with('@') {
            rest = rest.split_once(' ')?.1.trim_start();
        }

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, tail) = stripped.split_once(' ')?;
                rest = tail.trim_start();
                Some(prefix.to_string())
            }
            None => None,
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => (rest, None),
        };

        let mut parts = head.split(' ').filter(|part| !part.is_empty());
        let command = parts.next()?.to_ascii_uppercase();
        let mut params: Vec<String> = parts.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Some(Self {
            prefix,
            command,
            params,
        })
    }

    /// The nick part of a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|prefix| prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

/// Inbound events the bot cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcEvent {
    /// RPL_WELCOME (001): registration finished.
    Welcome,
    Cap {
        subcommand: String,
        capabilities: Vec<String>,
    },
    /// ERR_NICKNAMEINUSE (433).
    NicknameInUse,
    /// PRIVMSG to a channel or to the bot itself.
    Message {
        nick: String,
        target: String,
        text: String,
    },
    /// RPL_TOPIC (332), or RPL_NOTOPIC (331) reported as an empty topic.
    TopicReport {
        channel: String,
        topic: String,
    },
    Ping(String),
    Other(IrcMessage),
}

impl From<IrcMessage> for IrcEvent {
    fn from(msg: IrcMessage) -> Self {
        let command = msg.command.clone();
        match command.as_str() {
            "001" => IrcEvent::Welcome,
            "433" => IrcEvent::NicknameInUse,
            "PING" => IrcEvent::Ping(msg.param(0).unwrap_or_default().to_string()),
            "CAP" if msg.params.len() >= 2 => IrcEvent::Cap {
                subcommand: msg.params[1].to_ascii_uppercase(),
                capabilities: msg
                    .param(2)
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
            },
            "332" if msg.params.len() >= 3 => IrcEvent::TopicReport {
                channel: msg.params[1].clone(),
                topic: msg.params[2].clone(),
            },
            "331" if msg.params.len() >= 2 => IrcEvent::TopicReport {
                channel: msg.params[1].clone(),
                topic: String::new(),
            },
            "PRIVMSG" if msg.prefix.is_some() && msg.params.len() >= 2 => IrcEvent::Message {
                nick: msg.nick().unwrap_or_default().to_string(),
                target: msg.params[0].clone(),
                text: msg.params[1].clone(),
            },
            _ => IrcEvent::Other(msg),
        }
    }
}

/// Outbound commands, one line each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcCommand {
    Nick(String),
    User { username: String, realname: String },
    CapReq(String),
    CapEnd,
    Join(String),
    Privmsg { target: String, text: String },
    /// `None` queries the current topic; `Some` sets it.
    Topic { channel: String, topic: Option<String> },
    Pong(String),
    Quit(String),
}

impl IrcCommand {
    /// Encodes the command without the line terminator.
    pub fn to_line(&self) -> String {
        match self {
            IrcCommand::Nick(nick) => format!("NICK {nick}"),
            IrcCommand::User { username, realname } => {
                format!("USER {username} 0 * :{}", single_line(realname))
            }
            IrcCommand::CapReq(capability) => format!("CAP REQ :{capability}"),
            IrcCommand::CapEnd => "CAP END".to_string(),
            IrcCommand::Join(channel) => format!("JOIN {channel}"),
            IrcCommand::Privmsg { target, text } => {
                format!("PRIVMSG {target} :{}", single_line(text))
            }
            IrcCommand::Topic {
                channel,
                topic: None,
            } => format!("TOPIC {channel}"),
            IrcCommand::Topic {
                channel,
                topic: Some(topic),
            } => format!("TOPIC {channel} :{}", single_line(topic)),
            IrcCommand::Pong(token) => format!("PONG :{token}"),
            IrcCommand::Quit(reason) => format!("QUIT :{}", single_line(reason)),
        }
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
