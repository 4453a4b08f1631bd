//! The `bot` module ties the IRC session to the command pipeline.
//!
//! Inbound events are handled on the event loop by [`StatusBot`]: pings are
//! answered, topic reports go to the topic store, session events drive
//! [`session::Session`], and messages pass through the
//! [`authorizer::Authorizer`]. Admitted commands are queued for the
//! [`dispatcher::Dispatcher`], which runs them one at a time on its own
//! task.

pub mod authorizer;
pub mod broadcast;
pub mod command;
pub mod dispatcher;
pub mod session;

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::bot::authorizer::{Admission, Authorizer, Rejection};
use crate::bot::broadcast::Broadcaster;
use crate::bot::dispatcher::Dispatcher;
use crate::bot::session::{Session, SessionAction, SessionConfig, SessionState};
use crate::config::Settings;
use crate::persistence::{EntryLogs, Journal};
use crate::publisher::{
    AlertFilePublisher, HttpMicroblogClient, MediaWikiClient, MicroblogPublisher, NullPublisher,
    Publisher, PublisherSet, WikiApi, WikiEntryPage, WikiStatusPublisher, panic_message,
};
use crate::topics::TopicStoreHandle;
use crate::transport::{IrcCommand, IrcEvent, IrcHandle, connect};
use crate::utils::error::{BotError, IrcError};

const QUIT_MESSAGE: &str = "statusbot shutting down";

/// Event-loop side of the bot.
pub struct StatusBot {
    session: Session,
    authorizer: Authorizer,
    irc: IrcHandle,
    topics: TopicStoreHandle,
    commands: UnboundedSender<Admission>,
}

impl StatusBot {
    pub fn new(
        settings: &Settings,
        irc: IrcHandle,
        topics: TopicStoreHandle,
        commands: UnboundedSender<Admission>,
    ) -> Self {
        Self {
            session: Session::new(SessionConfig::new(&settings.irc, &settings.timing)),
            authorizer: Authorizer::new(&settings.irc.trigger, &settings.irc.nicks),
            irc,
            topics,
            commands,
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub async fn handle_event(&mut self, event: IrcEvent) -> Result<(), IrcError> {
        match event {
            IrcEvent::Ping(token) => self.irc.send(IrcCommand::Pong(token)),
            IrcEvent::TopicReport { channel, topic } => {
                self.topics.observe(&channel, &topic);
                Ok(())
            }
            IrcEvent::Message { nick, target, text } => {
                self.handle_message(&nick, &target, &text);
                Ok(())
            }
            event => {
                for action in self.session.on_event(&event) {
                    match action {
                        SessionAction::Send(command) => self.irc.send(command)?,
                        SessionAction::Pause(delay) => sleep(delay).await,
                    }
                }
                Ok(())
            }
        }
    }

    fn handle_message(&self, nick: &str, target: &str, text: &str) {
        match self
            .authorizer
            .admit(self.session.state(), nick, target, text)
        {
            Ok(admission) => {
                let command = admission.command();
                info!(
                    "Queueing {} from {} in {} ({})",
                    command.verb, nick, target, command.id
                );
                if self.commands.send(admission).is_err() {
                    error!("Dispatcher stopped; dropping command from {nick}");
                }
            }
            Err(Rejection::MissingTrigger) => {}
            Err(rejection) => debug!("Ignoring command from {nick} in {target}: {rejection}"),
        }
    }
}

/// Builds the publisher list and the success/thanks sinks from `settings`.
///
/// Publishers are registered in a fixed order: wiki, alert file,
/// microblog. With none configured the null publisher is used.
pub fn build_sinks(settings: &Settings) -> Result<(PublisherSet, EntryLogs), BotError> {
    let mut publishers: Vec<Arc<dyn Publisher>> = Vec::new();
    let mut entry_logs = EntryLogs::default();

    if let Some(journal) = &settings.journal {
        let journal = Journal::open(Path::new(&journal.path))?;
        entry_logs.register_all(Arc::new(journal));
    }

    if let Some(wiki) = &settings.wiki {
        let api: Arc<dyn WikiApi> = Arc::new(
            MediaWikiClient::new(wiki).map_err(|e| BotError::Publisher("wiki", e))?,
        );
        publishers.push(Arc::new(WikiStatusPublisher::new(Arc::clone(&api), wiki.pageid)));
        if let Some(pageid) = wiki.success_pageid {
            entry_logs
                .success
                .push(Arc::new(WikiEntryPage::new(Arc::clone(&api), pageid, "wiki-success")));
        }
        if let Some(pageid) = wiki.thanks_pageid {
            entry_logs
                .thanks
                .push(Arc::new(WikiEntryPage::new(api, pageid, "wiki-thanks")));
        }
    }

    if let Some(alertfile) = &settings.alertfile {
        let publisher =
            AlertFilePublisher::new(&alertfile.dir).map_err(|e| BotError::Publisher("alertfile", e))?;
        publishers.push(Arc::new(publisher));
    }

    if let Some(microblog) = &settings.microblog {
        let client = HttpMicroblogClient::new(microblog)
            .map_err(|e| BotError::Publisher("microblog", e))?;
        publishers.push(Arc::new(MicroblogPublisher::new(
            Arc::new(client),
            microblog.post_logs,
        )));
    }

    if publishers.is_empty() {
        publishers.push(Arc::new(NullPublisher));
    }

    Ok((
        PublisherSet::new(publishers, settings.timing.publish_timeout()),
        entry_logs,
    ))
}

/// Connects and runs the bot until the server closes the connection or
/// the process is interrupted.
pub async fn run(settings: Settings) -> Result<(), BotError> {
    let (publishers, entry_logs) = build_sinks(&settings)?;
    info!("Registered publishers: {}", publishers.names().join(", "));

    let (irc, mut events) = connect(&settings.irc).await?;
    let topics = TopicStoreHandle::spawn(settings.irc.channels.clone());

    let broadcaster = Broadcaster::new(
        irc.clone(),
        settings.irc.channels.clone(),
        settings.timing.send_delay(),
        settings.irc.use_chanserv,
    );
    let dispatcher = Dispatcher::new(
        broadcaster,
        topics.clone(),
        publishers,
        entry_logs,
        settings.timing.clone(),
    );
    let (commands, queue) = mpsc::unbounded_channel();
    let dispatcher = tokio::spawn(dispatcher.run(queue));

    let mut bot = StatusBot::new(&settings, irc.clone(), topics, commands);

    let result = loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    warn!("Disconnected from {}", settings.irc.server);
                    break Err(BotError::Irc(IrcError::Closed));
                };
                match AssertUnwindSafe(bot.handle_event(event)).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => break Err(e.into()),
                    Err(panic) => error!(
                        "Panic while handling irc event: {}",
                        panic_message(panic.as_ref())
                    ),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, quitting");
                if let Err(e) = irc.send(IrcCommand::Quit(QUIT_MESSAGE.to_string())) {
                    debug!("Could not send QUIT: {e}");
                }
                // Give the writer a moment to flush the QUIT line.
                sleep(settings.timing.send_delay()).await;
                break Ok(());
            }
        }
    };

    dispatcher.abort();
    result
}
