//! Transport capability traits
//!
//! The radio layer is an external collaborator. The engines only need two
//! things from it: a synchronous "send this chunk now" primitive that may
//! refuse under backpressure, and the connection-management verbs the
//! lifecycle delegates to. The wire encoding of notify vs. write is the
//! transport's business; here a chunk is just bytes.

use crate::Result;

// ----------------------------------------------------------------------------
// Chunk Sink
// ----------------------------------------------------------------------------

/// Outcome of offering one chunk to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Accepted for transmission
    Sent,
    /// Refused; the transport guarantees exactly one future ready-to-send
    /// signal, which is the sole resumption mechanism
    Backpressured,
}

impl SendOutcome {
    /// True if the chunk was accepted
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

/// Synchronous chunk transmission primitive.
///
/// Mirrors the CoreBluetooth `updateValue` contract: the call either accepts
/// the chunk immediately or reports backpressure, and a refused send is
/// always followed (eventually) by one ready-to-send notification.
pub trait ChunkSink {
    fn send_chunk(&mut self, chunk: &[u8]) -> SendOutcome;
}

// ----------------------------------------------------------------------------
// Link Control
// ----------------------------------------------------------------------------

/// Connection-management verbs delegated to the transport.
///
/// Discovery, connection establishment, and characteristic subscription are
/// radio-layer concerns; the lifecycle only decides *when* to invoke them.
pub trait LinkControl {
    /// Establish (or re-establish) a connection to the known peer
    fn connect(&mut self) -> Result<()>;

    /// Tear down the current connection
    fn disconnect(&mut self) -> Result<()>;

    /// Begin scanning / advertising for a counterpart
    fn discover(&mut self) -> Result<()>;

    /// Subscribe to the transfer characteristic of the connected peer
    fn subscribe(&mut self) -> Result<()>;

    /// Toggle advertising visibility without dropping queued messages
    fn set_advertising(&mut self, enabled: bool) -> Result<()>;
}

// ----------------------------------------------------------------------------
// Channel Transport
// ----------------------------------------------------------------------------

/// Full transport capability consumed by a [`crate::Link`]
pub trait ChannelTransport: ChunkSink + LinkControl {}

impl<T: ChunkSink + LinkControl> ChannelTransport for T {}
