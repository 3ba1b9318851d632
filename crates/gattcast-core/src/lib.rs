//! Gattcast Core Protocol Implementation
//!
//! This crate provides the chunked-transfer flow-control engines for a
//! point-to-point bulk-data link over a low-MTU, notification-based transport
//! (modeled on BLE GATT characteristics). One side pushes a queue of messages
//! as MTU-bounded chunks with explicit end-of-message framing; the other side
//! reassembles them and acknowledges each message before the queue advances.
//!
//! The radio layer itself (discovery, connection establishment, service
//! setup) is an external collaborator reached through the capability traits
//! in [`transport`]; everything here is a set of single-threaded state
//! machines driven strictly by transport-delivered events.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod receiver;
pub mod sender;
pub mod transport;
pub mod types;
pub mod wire;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::LinkConfig;
pub use errors::{LinkError, Result};
pub use events::{EventReceiver, EventSender, LinkEvent};
pub use lifecycle::Link;
pub use receiver::ReceiverEngine;
pub use sender::{SenderEngine, SenderState};
pub use transport::{ChannelTransport, ChunkSink, LinkControl, SendOutcome};
pub use types::{ConnectionContext, PeerHandle};
