use std::collections::HashMap;

use crate::utils::error::TopicError;

/// Where the store is in a save or restore sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicStoreState {
    Idle,
    /// Topic reports are being captured into the cache.
    Recording,
    /// The cache has been handed out to put the saved topics back.
    Restoring,
}

impl TopicStoreState {
    pub fn as_label(&self) -> &'static str {
        match self {
            TopicStoreState::Idle => "idle",
            TopicStoreState::Recording => "recording",
            TopicStoreState::Restoring => "restoring",
        }
    }
}

/// Result of asking the store to start a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStart {
    /// Recording mode entered; topics must now be queried.
    Started,
    /// A snapshot from an earlier alert is still held and must not be
    /// overwritten with alert topics.
    AlreadySaved,
}

/// Saved-topic cache for a fixed set of channels.
///
/// Only reports observed while `Recording` are kept. The cache is emptied
/// by a failed save or by a restore, never by unrelated topic changes.
#[derive(Debug)]
pub struct TopicStore {
    channels: Vec<String>,
    state: TopicStoreState,
    cache: HashMap<String, String>,
}

impl TopicStore {
    pub fn new(channels: Vec<String>) -> Self {
        Self {
            channels,
            state: TopicStoreState::Idle,
            cache: HashMap::new(),
        }
    }

    pub fn state(&self) -> TopicStoreState {
        self.state
    }

    pub fn cache(&self) -> &HashMap<String, String> {
        &self.cache
    }

    pub fn begin_save(&mut self) -> Result<SaveStart, TopicError> {
        match self.state {
            TopicStoreState::Idle if !self.cache.is_empty() => Ok(SaveStart::AlreadySaved),
            TopicStoreState::Idle => {
                self.state = TopicStoreState::Recording;
                Ok(SaveStart::Started)
            }
            busy => Err(TopicError::Busy(busy.as_label())),
        }
    }

    /// Records a topic report. Returns whether it was kept.
    pub fn observe(&mut self, channel: &str, topic: &str) -> bool {
        if self.state != TopicStoreState::Recording {
            return false;
        }
        // Servers may echo the channel name in a different case.
        match self.channels.iter().find(|c| c.eq_ignore_ascii_case(channel)) {
            Some(known) => {
                self.cache.insert(known.clone(), topic.to_string());
                true
            }
            None => false,
        }
    }

    /// Channels that have not reported yet.
    pub fn missing(&self) -> Vec<String> {
        self.channels
            .iter()
            .filter(|c| !self.cache.contains_key(*c))
            .cloned()
            .collect()
    }

    /// Leaves recording mode. An incomplete snapshot is discarded so a
    /// partial save is never restored later.
    pub fn finish_save(&mut self) -> Result<(), TopicError> {
        if self.state != TopicStoreState::Recording {
            return Ok(());
        }
        self.state = TopicStoreState::Idle;

        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            self.cache.clear();
            Err(TopicError::Timeout { missing })
        }
    }

    /// Hands out one `(channel, topic)` pair per channel and empties the
    /// cache. Channels without a saved topic fall back to their own name.
    pub fn begin_restore(&mut self) -> Result<Vec<(String, String)>, TopicError> {
        if self.state != TopicStoreState::Idle {
            return Err(TopicError::Busy(self.state.as_label()));
        }
        self.state = TopicStoreState::Restoring;

        let mut cache = std::mem::take(&mut self.cache);
        Ok(self
            .channels
            .iter()
            .map(|channel| {
                let topic = cache.remove(channel).unwrap_or_else(|| channel.clone());
                (channel.clone(), topic)
            })
            .collect())
    }

    pub fn finish_restore(&mut self) {
        if self.state == TopicStoreState::Restoring {
            self.state = TopicStoreState::Idle;
        }
    }
}
