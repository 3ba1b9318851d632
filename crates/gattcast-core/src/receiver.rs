//! Receiver engine: chunk reassembly, EOM detection, acknowledgment
//!
//! Accumulates inbound data chunks per connection until the end-of-message
//! sentinel arrives, delivers the reassembled message upward, and replies
//! with the acknowledgment sentinel. A backpressured acknowledgment is kept
//! pending and retried from the next ready-to-send signal, so the ack is
//! never silently lost.

use tracing::{debug, trace};

use crate::events::{self, EventSender, LinkEvent};
use crate::transport::{ChunkSink, SendOutcome};
use crate::wire::{self, ChunkKind};

// ----------------------------------------------------------------------------
// Receiver Engine
// ----------------------------------------------------------------------------

/// Reassembles inbound chunks into complete messages
pub struct ReceiverEngine {
    /// Append-only accumulator; cleared after each EOM and on reset
    buffer: Vec<u8>,
    /// An acknowledgment was refused by the transport and awaits retry
    pending_ack: bool,
    events: EventSender,
}

impl ReceiverEngine {
    pub fn new(events: EventSender) -> Self {
        Self {
            buffer: Vec::new(),
            pending_ack: false,
            events,
        }
    }

    /// Handle one inbound chunk.
    ///
    /// EOM finalizes the buffer into a message and acknowledges it; any
    /// other decodable chunk is appended. Undecodable chunks are dropped
    /// without touching the accumulation state.
    pub fn on_chunk_received(&mut self, bytes: &[u8], sink: &mut dyn ChunkSink) {
        match wire::classify(bytes) {
            ChunkKind::Malformed => {
                trace!(
                    len = bytes.len(),
                    prefix = %hex::encode(&bytes[..bytes.len().min(8)]),
                    "dropping undecodable chunk"
                );
            }
            ChunkKind::Eom => {
                let message = core::mem::take(&mut self.buffer);
                debug!(len = message.len(), "message reassembled");
                events::emit(&self.events, LinkEvent::MessageReceived { message });
                self.send_ack(sink);
            }
            // Data, including payloads that spell the ack sentinel; routing
            // of real acks happens before the chunk reaches this engine
            _ => {
                self.buffer.extend_from_slice(bytes);
                events::emit(
                    &self.events,
                    LinkEvent::PartialData {
                        bytes: bytes.to_vec(),
                    },
                );
            }
        }
    }

    /// Retry a pending acknowledgment once the transport is ready again.
    pub fn on_ready_to_send(&mut self, sink: &mut dyn ChunkSink) {
        if self.pending_ack {
            self.pending_ack = false;
            self.send_ack(sink);
        }
    }

    /// Idempotent reset: clears the buffer and any pending acknowledgment.
    /// No partial message is ever delivered upward after this.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pending_ack = false;
    }

    fn send_ack(&mut self, sink: &mut dyn ChunkSink) {
        match sink.send_chunk(wire::ACK) {
            SendOutcome::Sent => {
                events::emit(&self.events, LinkEvent::AckSent);
            }
            SendOutcome::Backpressured => {
                self.pending_ack = true;
                debug!("ack backpressured, queued for retry");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn has_pending_ack(&self) -> bool {
        self.pending_ack
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
