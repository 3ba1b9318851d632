//! Error types for the gattcast link
//!
//! Nothing inside the transfer protocol itself is fatal: backpressure is
//! resolved by the next ready-to-send signal, undecodable chunks are dropped,
//! and lifecycle disruption is handled as transfer abandonment. `LinkError`
//! therefore only covers the seams around the protocol — the transport
//! capability and identifier parsing.

/// Errors surfaced by the link's outer seams
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Invalid peer handle: {0}")]
    InvalidPeerHandle(String),

    #[error("Transport capability failed: {reason}")]
    Transport { reason: String },
}

impl LinkError {
    /// Shorthand for a transport capability failure
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = core::result::Result<T, LinkError>;
