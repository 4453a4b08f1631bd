//! TCP connection to the IRC server.
//!
//! `connect` spawns two tasks:
//! - a reader that parses lines and forwards [`IrcEvent`]s to the bot
//! - a writer that drains the queue behind [`IrcHandle`] onto the socket
//!
//! The event receiver closes when the server drops the connection, which is
//! how the bot's event loop notices a disconnect.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::spawn;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace};

use crate::config::IrcSettings;
use crate::transport::codec::IrcLineCodec;
use crate::transport::message::{IrcCommand, IrcEvent, IrcMessage};
use crate::utils::error::IrcError;

/// Longest inbound line accepted, tags included.
const MAX_LINE_LENGTH: usize = 8191;

/// Cloneable sending side of the connection.
#[derive(Debug, Clone)]
pub struct IrcHandle {
    sender: UnboundedSender<IrcCommand>,
}

impl IrcHandle {
    /// Creates a handle and the receiver its commands are queued on.
    pub fn channel() -> (Self, UnboundedReceiver<IrcCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn send(&self, command: IrcCommand) -> Result<(), IrcError> {
        self.sender.send(command).map_err(|_| IrcError::Closed)
    }

    pub fn privmsg(&self, target: &str, text: &str) -> Result<(), IrcError> {
        self.send(IrcCommand::Privmsg {
            target: target.to_string(),
            text: text.to_string(),
        })
    }

    /// Asks the server for the current topic; the answer arrives later as
    /// an [`IrcEvent::TopicReport`].
    pub fn query_topic(&self, channel: &str) -> Result<(), IrcError> {
        self.send(IrcCommand::Topic {
            channel: channel.to_string(),
            topic: None,
        })
    }

    pub fn set_topic(&self, channel: &str, topic: &str) -> Result<(), IrcError> {
        self.send(IrcCommand::Topic {
            channel: channel.to_string(),
            topic: Some(topic.to_string()),
        })
    }
}

/// Connects, registers with `NICK`/`USER`, and returns the outbound handle
/// together with the stream of inbound events.
pub async fn connect(
    settings: &IrcSettings,
) -> Result<(IrcHandle, UnboundedReceiver<IrcEvent>), IrcError> {
    let stream = TcpStream::connect((settings.server.as_str(), settings.port)).await?;
    info!("Connected to {}:{}", settings.server, settings.port);

    let framed = Framed::new(stream, IrcLineCodec::new(MAX_LINE_LENGTH));
    let (mut sink, mut lines) = framed.split();

    let (handle, mut outbound) = IrcHandle::channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<IrcEvent>();

    spawn(async move {
        while let Some(command) = outbound.recv().await {
            let line = command.to_line();
            trace!(">> {line}");
            if let Err(e) = sink.send(line).await {
                error!("Failed to write to irc server: {e}");
                break;
            }
        }
        debug!("Writer loop closed");
    });

    spawn(async move {
        while let Some(frame) = lines.next().await {
            match frame {
                Ok(line) => {
                    trace!("<< {line}");
                    match IrcMessage::parse(&line) {
                        Some(msg) => {
                            if event_tx.send(IrcEvent::from(msg)).is_err() {
                                break;
                            }
                        }
                        None => debug!("Ignoring unparseable line: {line}"),
                    }
                }
                Err(e) => {
                    error!("Failed to read from irc server: {e}");
                    break;
                }
            }
        }
        info!("Connection to irc server closed");
    });

    handle.send(IrcCommand::Nick(settings.nick.clone()))?;
    handle.send(IrcCommand::User {
        username: settings.nick.clone(),
        realname: settings.nick.clone(),
    })?;

    Ok((handle, event_rx))
}
