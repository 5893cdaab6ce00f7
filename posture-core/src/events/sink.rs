//! EventSink trait definition
//!
//! The sink is the append-only audit trail for security events, with live
//! subscription and replay.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use super::types::{SecurityEvent, SecurityEventKind};

/// Sequence number for events (monotonically increasing)
pub type EventSeq = u64;

/// Append-only sink for SecurityEvents
///
/// Implementations must:
/// - Assign sequence numbers in emission order
/// - Broadcast each event to live subscribers
/// - Keep every event for replay
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append an event, returns its sequence number
    async fn publish(&self, event: SecurityEvent) -> EventSeq;

    /// Subscribe to all events from now (live stream)
    fn subscribe(&self) -> broadcast::Receiver<(EventSeq, SecurityEvent)>;

    /// All events starting from a sequence number (replay)
    async fn events_from(&self, seq: EventSeq) -> Vec<(EventSeq, SecurityEvent)>;

    /// All events of one kind, in emission order
    async fn events_of_kind(&self, kind: SecurityEventKind) -> Vec<(EventSeq, SecurityEvent)>;

    /// Current sequence number (high water mark)
    fn current_seq(&self) -> EventSeq;
}

/// Live events from `sink` as a `Stream`
///
/// A subscriber that falls behind the broadcast capacity skips the events it
/// missed; use [`EventSink::events_from`] to replay them.
pub fn event_stream(sink: &dyn EventSink) -> impl Stream<Item = (EventSeq, SecurityEvent)> + use<> {
    BroadcastStream::new(sink.subscribe()).filter_map(|item| match item {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(error = %e, "Security event subscriber lagged");
            None
        }
    })
}
