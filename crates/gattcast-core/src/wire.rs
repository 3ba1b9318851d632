//! Wire sentinels and chunk classification
//!
//! The protocol frames messages with two reserved textual sentinels: `"EOM"`
//! marks the end of a message, `"received"` acknowledges one. Any other
//! UTF-8 chunk is message data; anything undecodable is dropped.
//!
//! Sentinel-based framing is a global convention, not a length-prefixed
//! protocol: a data chunk that happens to equal a sentinel is
//! indistinguishable from the real thing. This is a known limitation of the
//! wire contract and is pinned by tests rather than papered over.

// ----------------------------------------------------------------------------
// Sentinels
// ----------------------------------------------------------------------------

/// End-of-message marker, sent after the last data chunk of a message
pub const EOM: &[u8] = b"EOM";

/// Acknowledgment marker, sent by the receiver after reassembling a message
pub const ACK: &[u8] = b"received";

// ----------------------------------------------------------------------------
// Chunk Classification
// ----------------------------------------------------------------------------

/// What a received chunk means at the protocol level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// End-of-message sentinel
    Eom,
    /// Acknowledgment sentinel
    Ack,
    /// Ordinary message data
    Data,
    /// Not valid UTF-8; dropped without touching any state
    Malformed,
}

/// Classify a raw chunk against the wire contract
pub fn classify(bytes: &[u8]) -> ChunkKind {
    match core::str::from_utf8(bytes) {
        Err(_) => ChunkKind::Malformed,
        Ok(text) if text.as_bytes() == EOM => ChunkKind::Eom,
        Ok(text) if text.as_bytes() == ACK => ChunkKind::Ack,
        Ok(_) => ChunkKind::Data,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
