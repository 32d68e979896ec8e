/*!
 * In-process notification bus for ingestion events.
 *
 * Downstream consumers (aggregation, scoring) subscribe to learn which
 * speeches changed. Emission is fire-and-forget: an event with no listener
 * is dropped.
 */

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::hansard::House;

/// Events published by the ingestion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IngestEvent {
    /// A batch of documents has been parsed and stored
    ParserCompleted {
        house: House,
        /// Every speech id touched by the batch
        speech_ids: BTreeSet<String>,
        timestamp: DateTime<Utc>,
    },

    /// One document has been stored
    DocumentIngested {
        path: PathBuf,
        part_count: usize,
        speech_count: usize,
        timestamp: DateTime<Utc>,
    },
}

impl IngestEvent {
    pub fn parser_completed(house: House, speech_ids: BTreeSet<String>) -> Self {
        Self::ParserCompleted {
            house,
            speech_ids,
            timestamp: Utc::now(),
        }
    }

    pub fn document_ingested(path: PathBuf, part_count: usize, speech_count: usize) -> Self {
        Self::DocumentIngested {
            path,
            part_count,
            speech_count,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast bus for `IngestEvent`s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<IngestEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns the number of subscribers reached, or the event back when
    /// nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: IngestEvent) -> Result<usize, broadcast::error::SendError<IngestEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscriber case
    pub fn emit_lossy(&self, event: IngestEvent) {
        if let Err(broadcast::error::SendError(event)) = self.tx.send(event) {
            debug!("No subscribers for event: {:?}", event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
