//! Security audit events

pub mod memory;
pub mod sink;
pub mod types;

pub use memory::MemoryEventSink;
pub use sink::{EventSeq, EventSink, event_stream};
pub use types::{SecurityEvent, SecurityEventKind};
