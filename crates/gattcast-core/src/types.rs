//! Core types for the gattcast link
//!
//! This module defines the fundamental identity types used throughout the
//! protocol, using newtype patterns for type safety.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Peer Handle
// ----------------------------------------------------------------------------

/// Opaque identity of a remote peer on the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerHandle(Uuid);

impl PeerHandle {
    /// Generate a fresh random peer handle
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PeerHandle {
    type Err = crate::LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| crate::LinkError::InvalidPeerHandle(e.to_string()))
    }
}

// ----------------------------------------------------------------------------
// Connection Context
// ----------------------------------------------------------------------------

/// Identity and negotiated parameters of the currently connected peer.
///
/// Owned by the link lifecycle; dropped on disconnect, failure, or explicit
/// stop so no state from one connection can leak into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionContext {
    /// The subscribed remote peer
    pub peer: PeerHandle,
    /// Negotiated maximum transmission unit in bytes
    pub mtu: usize,
}

impl ConnectionContext {
    /// Create a context for a freshly subscribed peer
    pub fn new(peer: PeerHandle, mtu: usize) -> Self {
        Self { peer, mtu }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
