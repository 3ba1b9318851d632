//! In-memory transport with scriptable backpressure
//!
//! [`ScriptedSink`] stands in for the radio: it records every accepted chunk
//! and can be told to refuse the next N sends, which is how tests exercise
//! the flow-control paths. [`LoopbackPair`] wires two links back to back and
//! moves accepted chunks across on demand, keeping event ordering fully
//! under test control.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use gattcast_core::transport::{ChunkSink, LinkControl, SendOutcome};
use gattcast_core::{EventReceiver, Link, LinkConfig, PeerHandle, Result};

use crate::channels::create_event_channel;

// ----------------------------------------------------------------------------
// Scripted Sink
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SinkState {
    accepted: Vec<Vec<u8>>,
    /// Per-call accept decision; empty means accept
    script: VecDeque<bool>,
    connects: usize,
    disconnects: usize,
    discovers: usize,
    subscribes: usize,
    advertising: Option<bool>,
}

/// Scriptable in-memory chunk sink. Clones share state, so a test can keep
/// an inspection handle while the link owns the transport.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSink {
    state: Arc<Mutex<SinkState>>,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.state.lock().expect("sink state poisoned")
    }

    /// Refuse the next `count` send attempts, then accept again
    pub fn refuse_next(&self, count: usize) {
        self.script(std::iter::repeat(false).take(count));
    }

    /// Append per-call accept decisions; once exhausted, every send is
    /// accepted again
    pub fn script(&self, decisions: impl IntoIterator<Item = bool>) {
        self.state().script.extend(decisions);
    }

    /// Snapshot of every chunk accepted so far
    pub fn accepted(&self) -> Vec<Vec<u8>> {
        self.state().accepted.clone()
    }

    /// Drain the accepted chunks, in acceptance order
    pub fn take_accepted(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.state().accepted)
    }

    pub fn discover_calls(&self) -> usize {
        self.state().discovers
    }

    pub fn connect_calls(&self) -> usize {
        self.state().connects
    }

    pub fn subscribe_calls(&self) -> usize {
        self.state().subscribes
    }

    pub fn disconnect_calls(&self) -> usize {
        self.state().disconnects
    }

    pub fn advertising(&self) -> Option<bool> {
        self.state().advertising
    }
}

impl ChunkSink for ScriptedSink {
    fn send_chunk(&mut self, chunk: &[u8]) -> SendOutcome {
        let mut state = self.state.lock().expect("sink state poisoned");
        if state.script.pop_front().unwrap_or(true) {
            state.accepted.push(chunk.to_vec());
            SendOutcome::Sent
        } else {
            SendOutcome::Backpressured
        }
    }
}

impl LinkControl for ScriptedSink {
    fn connect(&mut self) -> Result<()> {
        self.state().connects += 1;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.state().disconnects += 1;
        Ok(())
    }

    fn discover(&mut self) -> Result<()> {
        self.state().discovers += 1;
        Ok(())
    }

    fn subscribe(&mut self) -> Result<()> {
        self.state().subscribes += 1;
        Ok(())
    }

    fn set_advertising(&mut self, enabled: bool) -> Result<()> {
        self.state().advertising = Some(enabled);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Loopback Pair
// ----------------------------------------------------------------------------

/// Two links joined by an in-memory channel.
///
/// Chunks accepted on one side sit in its sink until [`LoopbackPair::pump`]
/// carries them to the other side's receive path, so tests decide exactly
/// when "the radio" delivers.
pub struct LoopbackPair {
    pub left: Link<ScriptedSink>,
    pub right: Link<ScriptedSink>,
    left_sink: ScriptedSink,
    right_sink: ScriptedSink,
    left_peer: PeerHandle,
    right_peer: PeerHandle,
}

impl LoopbackPair {
    /// Build a pair plus the event receivers for each side
    pub fn new(config: LinkConfig) -> (Self, EventReceiver, EventReceiver) {
        let left_sink = ScriptedSink::new();
        let right_sink = ScriptedSink::new();
        let (left_tx, left_rx) = create_event_channel(&config);
        let (right_tx, right_rx) = create_event_channel(&config);

        let pair = Self {
            left: Link::new(left_sink.clone(), config.clone(), left_tx),
            right: Link::new(right_sink.clone(), config, right_tx),
            left_sink,
            right_sink,
            left_peer: PeerHandle::generate(),
            right_peer: PeerHandle::generate(),
        };
        (pair, left_rx, right_rx)
    }

    /// Subscribe both ends to each other at the given MTU. The right side
    /// gets its context first so nothing it receives is treated as stale.
    pub fn connect(&mut self, mtu: usize) {
        self.right.on_subscribed(self.left_peer, mtu);
        self.left.on_subscribed(self.right_peer, mtu);
    }

    /// Carry accepted chunks across until both directions are quiescent.
    /// Returns the number of chunks delivered.
    pub fn pump(&mut self) -> usize {
        let mut moved = 0;
        loop {
            let to_right = self.left_sink.take_accepted();
            let to_left = self.right_sink.take_accepted();
            if to_right.is_empty() && to_left.is_empty() {
                break;
            }
            for chunk in to_right {
                self.right.on_chunk_received(&chunk);
                moved += 1;
            }
            for chunk in to_left {
                self.left.on_chunk_received(&chunk);
                moved += 1;
            }
        }
        tracing::trace!(moved, "loopback quiescent");
        moved
    }

    pub fn left_sink(&self) -> &ScriptedSink {
        &self.left_sink
    }

    pub fn right_sink(&self) -> &ScriptedSink {
        &self.right_sink
    }

    pub fn left_peer(&self) -> PeerHandle {
        self.left_peer
    }

    pub fn right_peer(&self) -> PeerHandle {
        self.right_peer
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
