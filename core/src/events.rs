//! Append-only notification log.

use serde::{Deserialize, Serialize};

use anchorage_types::{BlockHeight, Event, Notification, RegistryError};

use crate::paging;

/// Sequence numbers start at zero and equal the event's position in the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn range(&self, offset: usize, limit: usize) -> Result<&[Event], RegistryError> {
        paging::page(&self.events, offset, limit)
    }

    /// Everything at or after `sequence`; empty when `sequence` is past the end.
    #[must_use]
    pub fn since(&self, sequence: u64) -> &[Event] {
        let start = usize::try_from(sequence).unwrap_or(usize::MAX);
        self.events.get(start..).unwrap_or_default()
    }

    /// Append one call's notifications together.
    pub(crate) fn append(
        &mut self,
        block: BlockHeight,
        notifications: impl IntoIterator<Item = Notification>,
    ) {
        for notification in notifications {
            let sequence = self.events.len() as u64;
            tracing::debug!("Event {sequence} at block {block}: {}", notification.name());
            self.events.push(Event {
                sequence,
                block,
                notification,
            });
        }
    }
}
