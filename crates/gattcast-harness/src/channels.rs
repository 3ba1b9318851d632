//! Event channel helpers
//!
//! Thin constructors over the Tokio mpsc channels the engines emit into,
//! sized from the link configuration, plus a non-blocking drain for tests
//! and the CLI.

use gattcast_core::{EventReceiver, EventSender, LinkConfig, LinkEvent};

/// Create the upward event channel for one link
pub fn create_event_channel(config: &LinkConfig) -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::channel(config.event_buffer_size)
}

/// Pull every event currently buffered, without blocking
pub fn drain_events(receiver: &mut EventReceiver) -> Vec<LinkEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
