//! Command dispatcher.
//!
//! Runs admitted commands one at a time on its own task, so the event loop
//! stays free to deliver the topic reports a save is waiting for.
//!
//! Alert state machine:
//! - `Idle --alert--> AlertActive`: save topics, broadcast, set topics, fan out
//! - `AlertActive --alert--> AlertActive`: same, keeping the first snapshot
//! - `AlertActive --ok--> Idle`: restore topics, broadcast, fan out
//! - `notice` / `log` never change state
//!
//! Failures are handled per stage: a topic save timeout skips the topic
//! changes but not the announcement, a publisher failure is logged and the
//! next publisher still runs, and any error or panic is caught at the
//! command boundary.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{Instrument, error, info, info_span, warn};

use crate::bot::authorizer::Admission;
use crate::bot::broadcast::{BroadcastOptions, Broadcaster};
use crate::bot::command::{Command, Verb};
use crate::config::TimingSettings;
use crate::persistence::{EntryKind, EntryLogs, LogEntry};
use crate::publisher::{PublishEvent, PublisherFailure, PublisherSet, panic_message};
use crate::topics::TopicStoreHandle;
use crate::utils::error::{DispatchError, TopicError};

const NOTICE_PREFIX: &str = "NOTICE: ";

/// The alert currently shown in channel topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAlert {
    pub text: String,
    /// Whether the channel topics were changed for this alert.
    pub topics_set: bool,
}

/// What happened while handling one command.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// The topic save failed and topics were left untouched.
    pub topic_error: Option<TopicError>,
    pub publisher_failures: Vec<PublisherFailure>,
    pub sink_failures: Vec<PublisherFailure>,
}

pub struct Dispatcher {
    broadcaster: Broadcaster,
    topics: TopicStoreHandle,
    publishers: PublisherSet,
    entry_logs: EntryLogs,
    timing: TimingSettings,
    alert: Option<ActiveAlert>,
}

impl Dispatcher {
    pub fn new(
        broadcaster: Broadcaster,
        topics: TopicStoreHandle,
        publishers: PublisherSet,
        entry_logs: EntryLogs,
        timing: TimingSettings,
    ) -> Self {
        Self {
            broadcaster,
            topics,
            publishers,
            entry_logs,
            timing,
            alert: None,
        }
    }

    pub fn alert(&self) -> Option<&ActiveAlert> {
        self.alert.as_ref()
    }

    /// Handles commands until the sending side is dropped.
    pub async fn run(mut self, mut commands: UnboundedReceiver<Admission>) {
        while let Some(admission) = commands.recv().await {
            let command = admission.command();
            let span = info_span!(
                "command",
                id = %command.id,
                verb = %command.verb,
                nick = %command.nick,
                channel = %command.channel
            );
            self.dispatch_isolated(admission).instrument(span).await;
        }
        info!("Command queue closed");
    }

    async fn dispatch_isolated(&mut self, admission: Admission) {
        match AssertUnwindSafe(self.dispatch(admission)).catch_unwind().await {
            Ok(Ok(report)) => {
                if !report.publisher_failures.is_empty() || !report.sink_failures.is_empty() {
                    warn!(
                        "Command finished with {} publisher failures",
                        report.publisher_failures.len() + report.sink_failures.len()
                    );
                }
            }
            Ok(Err(e)) => error!("Failed to handle command: {e}"),
            Err(panic) => error!(
                "Panic while handling command: {}",
                panic_message(panic.as_ref())
            ),
        }
    }

    pub async fn dispatch(&mut self, admission: Admission) -> Result<DispatchReport, DispatchError> {
        match admission {
            Admission::Privileged(command) => self.privileged(command).await,
            Admission::Unprivileged(command) => self.unprivileged(command).await,
        }
    }

    async fn privileged(&mut self, command: Command) -> Result<DispatchReport, DispatchError> {
        match command.verb {
            Verb::Alert if !command.text.is_empty() => self.raise(&command).await,
            Verb::Notice if !command.text.is_empty() => self.notice(&command).await,
            Verb::Log if !command.text.is_empty() => self.log(&command).await,
            Verb::Ok => self.clear(&command).await,
            _ => self.unknown(&command).await,
        }
    }

    async fn raise(&mut self, command: &Command) -> Result<DispatchReport, DispatchError> {
        info!("Processing alert from {}: {}", command.nick, command.text);
        self.ack(command, "sending alert").await?;
        let mut report = DispatchReport::default();

        let topics_set = match self
            .topics
            .save_all(self.broadcaster.irc(), self.broadcaster.channels(), &self.timing)
            .await
        {
            Ok(_) => true,
            Err(DispatchError::Topic(e)) => {
                error!("Unable to save topics, leaving them unchanged: {e}");
                report.topic_error = Some(e);
                false
            }
            Err(e) => return Err(e),
        };

        self.alert = Some(ActiveAlert {
            text: command.text.clone(),
            topics_set,
        });

        self.broadcaster
            .broadcast(
                NOTICE_PREFIX,
                &command.text,
                BroadcastOptions {
                    set_topic: topics_set,
                    restore: None,
                },
            )
            .await?;

        report.publisher_failures = self
            .publishers
            .fan_out(&PublishEvent::Alert(command.text.clone()))
            .await;
        self.ack(command, "finished sending alert").await?;
        Ok(report)
    }

    async fn notice(&mut self, command: &Command) -> Result<DispatchReport, DispatchError> {
        info!("Processing notice from {}: {}", command.nick, command.text);
        self.ack(command, "sending notice").await?;

        self.broadcaster
            .broadcast(NOTICE_PREFIX, &command.text, BroadcastOptions::default())
            .await?;

        let report = DispatchReport {
            publisher_failures: self
                .publishers
                .fan_out(&PublishEvent::Notice(command.text.clone()))
                .await,
            ..Default::default()
        };
        self.ack(command, "finished sending notice").await?;
        Ok(report)
    }

    async fn log(&mut self, command: &Command) -> Result<DispatchReport, DispatchError> {
        info!("Processing log from {}: {}", command.nick, command.text);

        let report = DispatchReport {
            publisher_failures: self
                .publishers
                .fan_out(&PublishEvent::Log(command.text.clone()))
                .await,
            ..Default::default()
        };
        self.ack(command, "finished logging").await?;
        Ok(report)
    }

    async fn clear(&mut self, command: &Command) -> Result<DispatchReport, DispatchError> {
        info!("Processing ok from {}: {}", command.nick, command.text);
        self.ack(command, "sending ok").await?;

        let restore_topics = self.alert.as_ref().is_some_and(|alert| alert.topics_set);
        let plan = if restore_topics {
            Some(self.topics.restore_plan().await?)
        } else {
            None
        };

        let broadcast = self
            .broadcaster
            .broadcast(
                NOTICE_PREFIX,
                &command.text,
                BroadcastOptions {
                    set_topic: false,
                    restore: plan.as_deref(),
                },
            )
            .await;
        if plan.is_some() {
            self.topics.finish_restore();
        }
        broadcast?;
        self.alert = None;

        let text = Some(command.text.clone()).filter(|t| !t.is_empty());
        let report = DispatchReport {
            publisher_failures: self.publishers.fan_out(&PublishEvent::Ok(text)).await,
            ..Default::default()
        };
        self.ack(command, "finished sending ok").await?;
        Ok(report)
    }

    async fn unknown(&mut self, command: &Command) -> Result<DispatchReport, DispatchError> {
        info!(
            "Unknown command {} from {}: {}",
            command.verb, command.nick, command.text
        );
        self.ack(command, "unknown command").await?;
        Ok(DispatchReport::default())
    }

    async fn unprivileged(&mut self, command: Command) -> Result<DispatchReport, DispatchError> {
        let (kind, reply) = match command.verb {
            Verb::Success if !command.text.is_empty() => {
                (EntryKind::Success, "Added success to the success log")
            }
            Verb::Thanks if !command.text.is_empty() => {
                (EntryKind::Thanks, "Added your thanks to the thanks log")
            }
            _ => return self.unknown(&command).await,
        };
        info!(
            "Processing {} from {}: {}",
            kind.as_str(),
            command.nick,
            command.text
        );

        let entry = LogEntry::now(kind, &command.nick, &command.text);
        let mut report = DispatchReport::default();
        for sink in self.entry_logs.for_kind(kind) {
            if let Err(error) = sink.record(&entry).await {
                warn!(sink = sink.name(), "Failed to record {}: {error}", kind.as_str());
                report.sink_failures.push(PublisherFailure {
                    publisher: sink.name().to_string(),
                    error,
                });
            }
        }

        self.ack(&command, reply).await?;
        Ok(report)
    }

    async fn ack(&self, command: &Command, text: &str) -> Result<(), DispatchError> {
        self.broadcaster
            .send(&command.channel, &format!("{}: {text}", command.nick))
            .await?;
        Ok(())
    }
}
