//! Link lifecycle: keeping engine state consistent with the connection
//!
//! A [`Link`] owns the sender and receiver engines, the connection context,
//! and the bound transport capability, and dispatches every transport event
//! on one sequential path. Cancellation is modeled entirely through
//! lifecycle events: once the peer reference is cleared, in-flight
//! transmissions stop advancing and stale events are dropped.

use tracing::{debug, trace, warn};

use crate::config::LinkConfig;
use crate::events::{self, EventSender, LinkEvent};
use crate::receiver::ReceiverEngine;
use crate::sender::SenderEngine;
use crate::transport::ChannelTransport;
use crate::types::{ConnectionContext, PeerHandle};
use crate::wire::{self, ChunkKind};
use crate::Result;

// ----------------------------------------------------------------------------
// Link
// ----------------------------------------------------------------------------

/// One end of a gattcast link: both engines plus their shared lifecycle.
///
/// Single-peer by design: at most one connection context exists at a time,
/// and all state transitions run in response to transport-delivered events
/// on one sequential execution context.
pub struct Link<T: ChannelTransport> {
    transport: T,
    sender: SenderEngine,
    receiver: ReceiverEngine,
    context: Option<ConnectionContext>,
    config: LinkConfig,
    events: EventSender,
    /// Advertising toggle; a disabled link skips rediscovery
    enabled: bool,
}

impl<T: ChannelTransport> Link<T> {
    pub fn new(transport: T, config: LinkConfig, events: EventSender) -> Self {
        let sender = SenderEngine::new(events.clone());
        let receiver = ReceiverEngine::new(events.clone());
        Self {
            transport,
            sender,
            receiver,
            context: None,
            config,
            events,
            enabled: true,
        }
    }

    /// Start the link: delegate discovery to the transport and report up.
    pub fn start(&mut self) -> Result<()> {
        self.transport.discover()?;
        events::emit(&self.events, LinkEvent::Started);
        Ok(())
    }

    /// Toggle advertising visibility without touching the queue.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.enabled = enabled;
        self.transport.set_advertising(enabled)
    }

    /// Replace the outbound queue; transmission begins on the next
    /// subscription.
    pub fn enqueue(&mut self, messages: Vec<Vec<u8>>) {
        self.sender.enqueue(messages);
    }

    // ------------------------------------------------------------------------
    // Transport Event Dispatch
    // ------------------------------------------------------------------------

    /// A device was discovered; connect and subscribe if its signal clears
    /// the configured threshold.
    pub fn on_device_discovered(&mut self, peer: PeerHandle, rssi: i8) -> Result<()> {
        if rssi < self.config.min_rssi {
            trace!(%peer, rssi, "discovered device below signal threshold");
            return Ok(());
        }
        debug!(%peer, rssi, "connecting to discovered device");
        self.transport.connect()?;
        self.transport.subscribe()
    }

    /// The peer subscribed to the transfer characteristic: record it and
    /// begin sending the first queued message.
    pub fn on_subscribed(&mut self, peer: PeerHandle, mtu: usize) {
        let mtu = if mtu == 0 {
            warn!("transport reported zero MTU, assuming default");
            self.config.default_mtu
        } else {
            mtu
        };

        self.context = Some(ConnectionContext::new(peer, mtu));
        events::emit(&self.events, LinkEvent::DeviceDetected { peer });
        debug!(%peer, mtu, "peer subscribed");
        self.sender.on_subscribed(mtu, &mut self.transport);
    }

    /// The peer unsubscribed: clear it; sends become no-ops until a new
    /// subscription.
    pub fn on_unsubscribed(&mut self) {
        self.context = None;
        self.sender.on_unsubscribed();
        debug!("peer unsubscribed");
    }

    /// An inbound chunk arrived. Acknowledgments go to the sender, data and
    /// EOM to the receiver. Chunks for a cleared peer are stale and dropped.
    pub fn on_chunk_received(&mut self, bytes: &[u8]) {
        if self.context.is_none() {
            trace!(len = bytes.len(), "dropping chunk for stale peer");
            return;
        }
        match wire::classify(bytes) {
            ChunkKind::Ack => self.sender.on_ack(&mut self.transport),
            _ => self.receiver.on_chunk_received(bytes, &mut self.transport),
        }
    }

    /// The transport can accept sends again. The receiver flushes any
    /// pending acknowledgment first, then the sender resumes its loop.
    pub fn on_ready_to_send(&mut self) {
        if self.context.is_none() {
            trace!("dropping ready signal for stale peer");
            return;
        }
        self.receiver.on_ready_to_send(&mut self.transport);
        self.sender.on_ready_to_send(&mut self.transport);
    }

    /// Connection lost: abandon any in-flight transfer, reset both engines,
    /// and delegate rediscovery to the transport. No partial message is
    /// delivered upward past this point.
    pub fn on_disconnected(&mut self) -> Result<()> {
        self.context = None;
        self.sender.reset();
        self.receiver.reset();
        debug!("disconnected, transient state cleared");
        if self.enabled {
            self.transport.discover()?;
        }
        Ok(())
    }

    /// The peer's service set changed under us; treated like a disconnect.
    pub fn on_service_invalidated(&mut self) -> Result<()> {
        self.on_disconnected()
    }

    /// Idempotent full reset of both engines' transient state. Queued but
    /// unsent messages remain queued for a future subscription.
    pub fn on_stop(&mut self) {
        self.context = None;
        self.sender.reset();
        self.receiver.reset();
    }

    /// Stop the link and tear the connection down.
    pub fn stop(&mut self) -> Result<()> {
        self.on_stop();
        self.transport.disconnect()
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn context(&self) -> Option<&ConnectionContext> {
        self.context.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.context.is_some()
    }

    pub fn sender(&self) -> &SenderEngine {
        &self.sender
    }

    pub fn receiver(&self) -> &ReceiverEngine {
        &self.receiver
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
