//! Sender engine: MTU-bounded chunking with flow control and ack gating
//!
//! Serializes a queue of messages into chunks no larger than the negotiated
//! MTU, frames each message with an end-of-message sentinel, and advances
//! through the queue only on the peer's acknowledgment.
//!
//! The engine is a pure state machine driven by transport events. The send
//! loop is re-entrant: it runs on subscribe and on every ready-to-send
//! signal, and a refused send simply stops it. There are no timers and no
//! retries beyond the transport's guaranteed ready signal.

use tracing::{debug, trace};

use crate::events::{self, EventSender, LinkEvent};
use crate::transport::{ChunkSink, SendOutcome};
use crate::wire;

// ----------------------------------------------------------------------------
// Sender State
// ----------------------------------------------------------------------------

/// Transmission state of the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// No transmission in progress
    Idle,
    /// Pushing data chunks of the current message
    Sending,
    /// EOM accepted; waiting for the peer's acknowledgment
    AwaitingAck,
}

// ----------------------------------------------------------------------------
// Sender Engine
// ----------------------------------------------------------------------------

/// Flow-controlled sender for a queue of outbound messages
pub struct SenderEngine {
    /// Pending outbound messages; preserved across resets
    queue: Vec<Vec<u8>>,
    /// Cursor into the queue for the message currently being transmitted
    index: usize,
    /// Bytes of the message currently being transmitted
    current: Vec<u8>,
    /// How much of `current` has been accepted by the transport
    offset: usize,
    /// Set when an EOM attempt was refused; retried before any data
    pending_eom: bool,
    state: SenderState,
    /// Negotiated MTU, valid while subscribed
    mtu: usize,
    /// Cleared on unsubscribe so stale ready signals cannot resume sending
    subscribed: bool,
    events: EventSender,
}

impl SenderEngine {
    pub fn new(events: EventSender) -> Self {
        Self {
            queue: Vec::new(),
            index: 0,
            current: Vec::new(),
            offset: 0,
            pending_eom: false,
            state: SenderState::Idle,
            mtu: 0,
            subscribed: false,
            events,
        }
    }

    /// Replace the pending queue and reset the cursor to the start.
    ///
    /// Calling this mid-transmission restarts: the in-flight message is
    /// abandoned and the new queue is sent from its first message on the
    /// next subscription. There are no partial-merge semantics.
    pub fn enqueue(&mut self, messages: Vec<Vec<u8>>) {
        self.queue = messages;
        self.index = 0;
        self.current.clear();
        self.offset = 0;
        self.pending_eom = false;
        self.state = SenderState::Idle;
        debug!(queued = self.queue.len(), "outbound queue replaced");
    }

    /// A peer subscribed: begin transmitting from the first queued message.
    pub fn on_subscribed(&mut self, mtu: usize, sink: &mut dyn ChunkSink) {
        self.subscribed = true;
        self.mtu = mtu;
        self.index = 0;
        self.pending_eom = false;

        if self.queue.is_empty() || mtu == 0 {
            // Nothing to send (or nothing sendable) is a no-op, not an error
            self.state = SenderState::Idle;
            return;
        }

        self.load_current();
        self.state = SenderState::Sending;
        self.send_loop(sink);
    }

    /// The transport is ready again after backpressure; resume the loop.
    /// This is the only way transmission resumes after a refused send.
    pub fn on_ready_to_send(&mut self, sink: &mut dyn ChunkSink) {
        self.send_loop(sink);
    }

    /// The peer acknowledged the last fully framed message.
    ///
    /// Advances the queue cursor; if that was the final message the cursor
    /// returns to 0 and the engine goes idle with the queue intact.
    pub fn on_ack(&mut self, sink: &mut dyn ChunkSink) {
        if self.state != SenderState::AwaitingAck {
            trace!("acknowledgment outside AwaitingAck ignored");
            return;
        }

        self.index += 1;
        if self.index < self.queue.len() {
            self.load_current();
            self.state = SenderState::Sending;
            debug!(index = self.index, "ack received, advancing queue");
            self.send_loop(sink);
        } else {
            self.index = 0;
            self.current.clear();
            self.offset = 0;
            self.state = SenderState::Idle;
            debug!("ack received, queue drained");
        }
    }

    /// The peer unsubscribed; subsequent send-loop invocations are no-ops
    /// until a new subscription occurs.
    pub fn on_unsubscribed(&mut self) {
        self.subscribed = false;
    }

    /// Idempotent reset of all transient transmission state.
    /// Queued-but-unsent messages remain queued for a future subscription.
    pub fn reset(&mut self) {
        self.index = 0;
        self.current.clear();
        self.offset = 0;
        self.pending_eom = false;
        self.state = SenderState::Idle;
        self.subscribed = false;
        self.mtu = 0;
    }

    fn load_current(&mut self) {
        self.current = self.queue[self.index].clone();
        self.offset = 0;
    }

    /// Re-entrant send loop: push chunks while the transport accepts them.
    ///
    /// A pending EOM is always retried first and is the only send attempted
    /// in that invocation; progress past it resumes on the next signal.
    /// At most one EOM is emitted per invocation.
    fn send_loop(&mut self, sink: &mut dyn ChunkSink) {
        if !self.subscribed {
            return;
        }

        if self.pending_eom {
            if sink.send_chunk(wire::EOM).is_sent() {
                self.pending_eom = false;
                self.state = SenderState::AwaitingAck;
                events::emit(&self.events, LinkEvent::EomSent);
                debug!(index = self.index, "flushed pending EOM");
            }
            return;
        }

        if self.state != SenderState::Sending {
            return;
        }

        loop {
            let remaining = self.current.len() - self.offset;
            if remaining > 0 {
                let amount = remaining.min(self.mtu);
                let chunk = &self.current[self.offset..self.offset + amount];
                match sink.send_chunk(chunk) {
                    SendOutcome::Backpressured => return,
                    SendOutcome::Sent => {
                        self.offset += amount;
                        trace!(len = amount, offset = self.offset, "data chunk sent");
                        events::emit(&self.events, LinkEvent::ChunkSent { len: amount });
                    }
                }
            }

            if self.offset == self.current.len() {
                // Message fully in flight; frame it with EOM
                match sink.send_chunk(wire::EOM) {
                    SendOutcome::Sent => {
                        self.state = SenderState::AwaitingAck;
                        events::emit(&self.events, LinkEvent::EomSent);
                        debug!(index = self.index, "message framed, awaiting ack");
                    }
                    SendOutcome::Backpressured => {
                        self.pending_eom = true;
                        trace!("EOM backpressured, flagged for retry");
                    }
                }
                return;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Queue cursor; stays put until the current message is acknowledged
    pub fn queue_index(&self) -> usize {
        self.index
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn has_pending_eom(&self) -> bool {
        self.pending_eom
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Minimal scriptable sink: pops a per-call accept decision, defaulting
    /// to accept, and records every accepted chunk.
    struct ScriptSink {
        accepted: Vec<Vec<u8>>,
        script: VecDeque<bool>,
    }

    impl ScriptSink {
        fn new() -> Self {
            Self {
                accepted: Vec::new(),
                script: VecDeque::new(),
            }
        }

        fn refuse_next(&mut self, count: usize) {
            self.script.extend(std::iter::repeat(false).take(count));
        }
    }

    impl ChunkSink for ScriptSink {
        fn send_chunk(&mut self, chunk: &[u8]) -> SendOutcome {
            if self.script.pop_front().unwrap_or(true) {
                self.accepted.push(chunk.to_vec());
                SendOutcome::Sent
            } else {
                SendOutcome::Backpressured
            }
        }
    }

    fn engine() -> (SenderEngine, crate::EventReceiver) {
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        (SenderEngine::new(tx), rx)
    }

    #[test]
    fn splits_message_into_mtu_bounded_chunks() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();

        sender.enqueue(vec![b"HELLOWORLD".to_vec()]);
        sender.on_subscribed(5, &mut sink);

        assert_eq!(
            sink.accepted,
            vec![b"HELLO".to_vec(), b"WORLD".to_vec(), b"EOM".to_vec()]
        );
        assert_eq!(sender.state(), SenderState::AwaitingAck);
    }

    #[test]
    fn chunk_lengths_never_exceed_mtu() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();

        sender.enqueue(vec![vec![0x41; 23]]);
        sender.on_subscribed(4, &mut sink);

        for chunk in &sink.accepted {
            assert!(chunk.len() <= 4);
        }
    }

    #[test]
    fn backpressure_reoffers_the_same_chunk() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();
        sink.refuse_next(1);

        sender.enqueue(vec![b"HELLOWORLD".to_vec()]);
        sender.on_subscribed(5, &mut sink);
        assert!(sink.accepted.is_empty());
        assert_eq!(sender.state(), SenderState::Sending);

        sender.on_ready_to_send(&mut sink);
        assert_eq!(sink.accepted[0], b"HELLO");
    }

    #[test]
    fn backpressured_eom_is_retried_alone() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();
        // Accept both data chunks, refuse the EOM
        sink.script.extend([true, true, false]);

        sender.enqueue(vec![b"HELLOWORLD".to_vec()]);
        sender.on_subscribed(5, &mut sink);
        assert!(sender.has_pending_eom());
        assert_eq!(sink.accepted.len(), 2);

        sender.on_ready_to_send(&mut sink);
        assert!(!sender.has_pending_eom());
        assert_eq!(sink.accepted.last().unwrap(), b"EOM");
        assert_eq!(sender.state(), SenderState::AwaitingAck);
    }

    #[test]
    fn queue_cursor_waits_for_ack() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();

        sender.enqueue(vec![b"A".to_vec(), b"B".to_vec()]);
        sender.on_subscribed(5, &mut sink);

        // First message framed; B must not have started
        assert_eq!(sink.accepted, vec![b"A".to_vec(), b"EOM".to_vec()]);
        assert_eq!(sender.queue_index(), 0);
        assert_eq!(sender.state(), SenderState::AwaitingAck);

        sender.on_ack(&mut sink);
        assert_eq!(
            sink.accepted,
            vec![b"A".to_vec(), b"EOM".to_vec(), b"B".to_vec(), b"EOM".to_vec()]
        );

        sender.on_ack(&mut sink);
        assert_eq!(sender.state(), SenderState::Idle);
        assert_eq!(sender.queue_index(), 0);
        assert_eq!(sender.queue_len(), 2); // queue contents preserved
    }

    #[test]
    fn empty_queue_subscription_is_a_noop() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();

        sender.on_subscribed(5, &mut sink);
        assert!(sink.accepted.is_empty());
        assert_eq!(sender.state(), SenderState::Idle);
    }

    #[test]
    fn empty_message_is_just_an_eom() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();

        sender.enqueue(vec![Vec::new()]);
        sender.on_subscribed(5, &mut sink);
        assert_eq!(sink.accepted, vec![b"EOM".to_vec()]);
        assert_eq!(sender.state(), SenderState::AwaitingAck);
    }

    #[test]
    fn ready_signal_after_unsubscribe_is_stale() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();
        sink.refuse_next(1);

        sender.enqueue(vec![b"HELLO".to_vec()]);
        sender.on_subscribed(5, &mut sink);
        sender.on_unsubscribed();

        sender.on_ready_to_send(&mut sink);
        assert!(sink.accepted.is_empty());
    }

    #[test]
    fn unexpected_ack_does_not_move_the_cursor() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();

        sender.enqueue(vec![b"A".to_vec(), b"B".to_vec()]);
        sender.on_ack(&mut sink); // still idle, nothing framed yet
        assert_eq!(sender.queue_index(), 0);
        assert!(sink.accepted.is_empty());
    }

    #[test]
    fn reset_is_idempotent_and_keeps_the_queue() {
        let (mut sender, _rx) = engine();
        let mut sink = ScriptSink::new();
        sink.script.extend([true, true, false]);

        sender.enqueue(vec![b"HELLOWORLD".to_vec()]);
        sender.on_subscribed(5, &mut sink);
        assert!(sender.has_pending_eom());

        sender.reset();
        sender.reset();
        assert_eq!(sender.state(), SenderState::Idle);
        assert_eq!(sender.queue_index(), 0);
        assert!(!sender.has_pending_eom());
        assert!(!sender.is_subscribed());
        assert_eq!(sender.queue_len(), 1);
    }

    #[test]
    fn emits_chunk_and_eom_events() {
        let (mut sender, mut rx) = engine();
        let mut sink = ScriptSink::new();

        sender.enqueue(vec![b"HELLOWORLD".to_vec()]);
        sender.on_subscribed(5, &mut sink);

        assert_eq!(rx.try_recv().unwrap(), LinkEvent::ChunkSent { len: 5 });
        assert_eq!(rx.try_recv().unwrap(), LinkEvent::ChunkSent { len: 5 });
        assert_eq!(rx.try_recv().unwrap(), LinkEvent::EomSent);
    }
}
