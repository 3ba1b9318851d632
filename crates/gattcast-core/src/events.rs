//! Upward event schema for the link
//!
//! Both engines report milestones to the embedding application through a
//! single bounded channel. Delivery is best-effort: an event that does not
//! fit is logged and dropped, never blocking the protocol path.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::PeerHandle;

// ----------------------------------------------------------------------------
// Link Events
// ----------------------------------------------------------------------------

/// Observability events mirroring role-specific milestones.
///
/// Consumers must treat these as best-effort notifications, not guarantees
/// of delivery to the remote peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkEvent {
    /// The link has started and delegated discovery to the transport
    Started,
    /// A peer subscribed to the transfer characteristic
    DeviceDetected { peer: PeerHandle },
    /// One data chunk was accepted by the transport
    ChunkSent { len: usize },
    /// The end-of-message marker for the current message was accepted
    EomSent,
    /// A non-sentinel chunk was appended to the receive buffer
    PartialData { bytes: Vec<u8> },
    /// A complete message was reassembled
    MessageReceived { message: Vec<u8> },
    /// The acknowledgment for the last reassembled message was accepted
    AckSent,
}

// ----------------------------------------------------------------------------
// Event Channel
// ----------------------------------------------------------------------------

pub type EventSender = tokio::sync::mpsc::Sender<LinkEvent>;
pub type EventReceiver = tokio::sync::mpsc::Receiver<LinkEvent>;

/// Non-blocking, best-effort event emission.
///
/// The engines run on the transport's event path and must never block on a
/// slow consumer; a full or closed channel drops the event with a warning.
pub fn emit(sender: &EventSender, event: LinkEvent) {
    if let Err(err) = sender.try_send(event) {
        warn!("dropping link event: {err}");
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
