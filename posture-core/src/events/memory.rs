//! In-memory EventSink implementation
//!
//! MemoryEventSink stores events in a Vec for replay and uses a broadcast
//! channel for live subscribers.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use super::sink::{EventSeq, EventSink};
use super::types::{SecurityEvent, SecurityEventKind};

/// In-memory implementation of EventSink
///
/// Sequence numbers are assigned while holding the write lock so replay
/// order always matches sequence order.
pub struct MemoryEventSink {
    /// Stored events with sequence numbers
    events: RwLock<Vec<(EventSeq, SecurityEvent)>>,
    /// Next sequence number to assign
    next_seq: AtomicU64,
    /// Broadcast channel for live subscribers
    tx: broadcast::Sender<(EventSeq, SecurityEvent)>,
}

impl MemoryEventSink {
    /// Create a new MemoryEventSink with the given broadcast channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            events: RwLock::new(Vec::new()),
            next_seq: AtomicU64::new(0),
            tx,
        }
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn publish(&self, event: SecurityEvent) -> EventSeq {
        let mut events = self.events.write().await;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        debug!(seq, kind = %event.kind, "Security event");

        events.push((seq, event.clone()));

        // Broadcast to live subscribers (ignore if no receivers)
        let _ = self.tx.send((seq, event));

        seq
    }

    fn subscribe(&self) -> broadcast::Receiver<(EventSeq, SecurityEvent)> {
        self.tx.subscribe()
    }

    async fn events_from(&self, seq: EventSeq) -> Vec<(EventSeq, SecurityEvent)> {
        self.events
            .read()
            .await
            .iter()
            .filter(|(s, _)| *s >= seq)
            .cloned()
            .collect()
    }

    async fn events_of_kind(&self, kind: SecurityEventKind) -> Vec<(EventSeq, SecurityEvent)> {
        self.events
            .read()
            .await
            .iter()
            .filter(|(_, event)| event.kind == kind)
            .cloned()
            .collect()
    }

    fn current_seq(&self) -> EventSeq {
        self.next_seq.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_stream::StreamExt;

    use super::*;
    use crate::events::event_stream;

    fn event(kind: SecurityEventKind) -> SecurityEvent {
        SecurityEvent::new(kind)
    }

    // ==================== Publish Tests ====================

    #[tokio::test]
    async fn publish_assigns_increasing_sequence_numbers() {
        let sink = MemoryEventSink::new(16);

        let seq1 = sink.publish(event(SecurityEventKind::InitSuccess)).await;
        let seq2 = sink
            .publish(event(SecurityEventKind::ProtectionEnabled))
            .await;
        let seq3 = sink
            .publish(event(SecurityEventKind::ProtectionDisabled))
            .await;

        assert_eq!((seq1, seq2, seq3), (0, 1, 2));
        assert_eq!(sink.current_seq(), 3);
    }

    // ==================== Subscribe Tests ====================

    #[tokio::test]
    async fn subscribe_receives_new_events_in_order() {
        let sink = MemoryEventSink::new(16);
        let mut rx = sink.subscribe();

        sink.publish(event(SecurityEventKind::RootDetected)).await;
        sink.publish(event(SecurityEventKind::CriticalViolation))
            .await;

        let (seq1, e1) = rx.recv().await.unwrap();
        let (seq2, e2) = rx.recv().await.unwrap();
        assert_eq!((seq1, seq2), (0, 1));
        assert_eq!(e1.kind, SecurityEventKind::RootDetected);
        assert_eq!(e2.kind, SecurityEventKind::CriticalViolation);
    }

    #[tokio::test]
    async fn event_stream_yields_published_events() {
        let sink = MemoryEventSink::new(16);
        let mut stream = Box::pin(event_stream(&sink));

        sink.publish(event(SecurityEventKind::InitFailed)).await;

        let (seq, e) = stream.next().await.unwrap();
        assert_eq!(seq, 0);
        assert_eq!(e.kind, SecurityEventKind::InitFailed);
    }

    // ==================== Replay Tests ====================

    #[tokio::test]
    async fn events_from_returns_events_starting_at_seq() {
        let sink = MemoryEventSink::new(16);
        for kind in [
            SecurityEventKind::EmulatorDetected,
            SecurityEventKind::RootDetected,
            SecurityEventKind::CriticalViolation,
        ] {
            sink.publish(event(kind)).await;
        }

        let events = sink.events_from(1).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, 1);
        assert_eq!(events[1].1.kind, SecurityEventKind::CriticalViolation);
        assert!(sink.events_from(10).await.is_empty());
    }

    #[tokio::test]
    async fn events_of_kind_filters() {
        let sink = MemoryEventSink::new(16);
        sink.publish(event(SecurityEventKind::SecurityViolation))
            .await;
        sink.publish(event(SecurityEventKind::ProtectionEnabled))
            .await;
        sink.publish(event(SecurityEventKind::SecurityViolation))
            .await;

        let violations = sink
            .events_of_kind(SecurityEventKind::SecurityViolation)
            .await;
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[1].0, 2);
    }

    // ==================== Concurrent Access Tests ====================

    #[tokio::test]
    async fn concurrent_publish_keeps_replay_in_sequence_order() {
        let sink = Arc::new(MemoryEventSink::new(1000));
        let mut handles = vec![];

        for _ in 0..10 {
            let sink = Arc::clone(&sink);
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    sink.publish(SecurityEvent::new(SecurityEventKind::SecurityViolation))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let events = sink.events_from(0).await;
        assert_eq!(events.len(), 100);
        for (i, (seq, _)) in events.iter().enumerate() {
            assert_eq!(*seq, i as u64);
        }
    }
}
