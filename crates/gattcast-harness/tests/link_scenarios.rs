//! End-to-end scenarios for the chunked-transfer link
//!
//! Drives two links over the loopback transport and checks the wire-level
//! contract: MTU-bounded chunks, EOM framing, ack-gated queue advancement,
//! and deterministic resets across lifecycle disruptions.

use gattcast_core::{LinkConfig, LinkEvent, SenderState};
use gattcast_harness::{drain_events, LoopbackPair};

fn pair() -> (
    LoopbackPair,
    gattcast_core::EventReceiver,
    gattcast_core::EventReceiver,
) {
    LoopbackPair::new(LinkConfig::default())
}

fn received_messages(events: &[LinkEvent]) -> Vec<Vec<u8>> {
    events
        .iter()
        .filter_map(|e| match e {
            LinkEvent::MessageReceived { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn helloworld_is_framed_as_two_chunks_and_eom() {
    let (mut pair, _left_rx, mut right_rx) = pair();
    pair.left.enqueue(vec![b"HELLOWORLD".to_vec()]);

    pair.right.on_subscribed(pair.left_peer(), 5);
    pair.left.on_subscribed(pair.right_peer(), 5);

    // The sender side accepted exactly HELLO, WORLD, EOM
    assert_eq!(
        pair.left_sink().accepted(),
        vec![b"HELLO".to_vec(), b"WORLD".to_vec(), b"EOM".to_vec()]
    );

    pair.pump();
    let events = drain_events(&mut right_rx);
    assert_eq!(received_messages(&events), vec![b"HELLOWORLD".to_vec()]);
}

#[test]
fn second_message_flows_after_ack_without_resubscription() {
    let (mut pair, mut left_rx, mut right_rx) = pair();
    pair.left.enqueue(vec![b"A".to_vec(), b"B".to_vec()]);
    pair.connect(5);

    // Before the ack crosses, the cursor must not have moved
    assert_eq!(pair.left.sender().queue_index(), 0);
    assert_eq!(pair.left.sender().state(), SenderState::AwaitingAck);

    // Deliver A + EOM, the ack comes back, B goes out, its ack comes back
    pair.pump();

    let right_events = drain_events(&mut right_rx);
    assert_eq!(
        received_messages(&right_events),
        vec![b"A".to_vec(), b"B".to_vec()]
    );
    assert_eq!(pair.left.sender().state(), SenderState::Idle);
    assert_eq!(pair.left.sender().queue_index(), 0);

    let left_events = drain_events(&mut left_rx);
    let eoms = left_events
        .iter()
        .filter(|e| matches!(e, LinkEvent::EomSent))
        .count();
    assert_eq!(eoms, 2); // one EOM per message, not one per queue
}

#[test]
fn backpressure_changes_timing_but_not_content() {
    let (mut pair, _left_rx, mut right_rx) = pair();
    pair.left.enqueue(vec![b"HELLOWORLD".to_vec()]);

    pair.right.on_subscribed(pair.left_peer(), 5);
    pair.left_sink().refuse_next(1);
    pair.left.on_subscribed(pair.right_peer(), 5);

    // First offer refused: nothing accepted, cursor unchanged
    assert!(pair.left_sink().accepted().is_empty());

    // The ready signal re-offers the exact same chunk
    pair.left.on_ready_to_send();
    assert_eq!(pair.left_sink().accepted()[0], b"HELLO");

    pair.pump();
    let events = drain_events(&mut right_rx);
    assert_eq!(received_messages(&events), vec![b"HELLOWORLD".to_vec()]);
}

#[test]
fn backpressured_ack_reaches_the_sender_eventually() {
    let (mut pair, _left_rx, _right_rx) = pair();
    pair.left.enqueue(vec![b"A".to_vec(), b"B".to_vec()]);

    pair.right.on_subscribed(pair.left_peer(), 5);
    pair.left.on_subscribed(pair.right_peer(), 5);

    // Refuse the right side's ack send when the EOM lands
    pair.right_sink().refuse_next(1);
    pair.pump();
    assert!(pair.right.receiver().has_pending_ack());
    assert_eq!(pair.left.sender().queue_index(), 0); // still gated

    // Ready signal flushes the ack; pump carries it back and B flows
    pair.right.on_ready_to_send();
    pair.pump();
    assert!(!pair.right.receiver().has_pending_ack());
    assert_eq!(pair.left.sender().state(), SenderState::Idle);
}

#[test]
fn disconnect_mid_transfer_never_delivers_a_partial_message() {
    let (mut pair, _left_rx, mut right_rx) = pair();
    pair.left.enqueue(vec![b"HELLOWORLD".to_vec()]);

    pair.right.on_subscribed(pair.left_peer(), 5);
    pair.left.on_subscribed(pair.right_peer(), 5);

    // Deliver only the first chunk by hand, then the link drops
    let chunks = pair.left_sink().take_accepted();
    pair.right.on_chunk_received(&chunks[0]);
    assert_eq!(pair.right.receiver().buffered_len(), 5);

    pair.right.on_disconnected().unwrap();
    assert_eq!(pair.right.receiver().buffered_len(), 0);

    let events = drain_events(&mut right_rx);
    assert!(received_messages(&events).is_empty());
}

#[test]
fn double_reset_leaves_identical_state() {
    let (mut pair, _left_rx, _right_rx) = pair();
    pair.left.enqueue(vec![b"HELLOWORLD".to_vec()]);
    pair.connect(5);

    pair.left.on_disconnected().unwrap();
    let discovers_after_first = pair.left_sink().discover_calls();
    pair.left.on_disconnected().unwrap();

    assert!(!pair.left.is_connected());
    assert_eq!(pair.left.sender().state(), SenderState::Idle);
    assert_eq!(pair.left.sender().queue_index(), 0);
    assert!(!pair.left.sender().has_pending_eom());
    assert_eq!(pair.left.receiver().buffered_len(), 0);
    // Rediscovery is re-attempted, state stays identical
    assert_eq!(pair.left_sink().discover_calls(), discovers_after_first + 1);
}

#[test]
fn sentinel_payload_collides_with_framing() {
    // Known wire limitation: a message that literally spells "EOM" is
    // indistinguishable from the framing marker, so the receiver sees an
    // empty message followed by a spurious one. Pinned, not fixed.
    let (mut pair, _left_rx, mut right_rx) = pair();
    pair.left.enqueue(vec![b"EOM".to_vec()]);
    pair.connect(5);
    pair.pump();

    let events = drain_events(&mut right_rx);
    let messages = received_messages(&events);
    assert_eq!(messages, vec![Vec::new(), Vec::new()]);
}

#[test]
fn ack_payload_collides_with_acknowledgment_routing() {
    // The other half of the same wire limitation: a data chunk spelling
    // "received" is routed to the peer's sender as an acknowledgment and
    // discarded there (its sender is idle), so the payload is lost and the
    // following EOM yields an empty message. Pinned, not fixed.
    let (mut pair, _left_rx, mut right_rx) = pair();
    pair.left.enqueue(vec![b"received".to_vec()]);
    pair.connect(20); // wide enough for the payload to ride in one chunk
    pair.pump();

    let events = drain_events(&mut right_rx);
    assert_eq!(received_messages(&events), vec![Vec::new()]);
    assert_eq!(pair.right.receiver().buffered_len(), 0);
    assert_eq!(pair.left.sender().state(), SenderState::Idle);
}

#[test]
fn queue_survives_stop_and_resends_on_next_subscription() {
    let (mut pair, _left_rx, mut right_rx) = pair();
    pair.left.enqueue(vec![b"again".to_vec()]);
    pair.connect(5);
    pair.pump();

    let events = drain_events(&mut right_rx);
    assert_eq!(received_messages(&events), vec![b"again".to_vec()]);

    pair.left.on_stop();
    assert_eq!(pair.left.sender().queue_len(), 1);

    // A fresh subscription replays the queue from the start
    pair.left.on_subscribed(pair.right_peer(), 5);
    pair.pump();
    let events = drain_events(&mut right_rx);
    assert_eq!(received_messages(&events), vec![b"again".to_vec()]);
}

#[test]
fn undecodable_chunk_is_dropped_mid_message() {
    let (mut pair, _left_rx, mut right_rx) = pair();
    pair.connect(5);

    pair.right.on_chunk_received(b"HELLO");
    pair.right.on_chunk_received(&[0xC3, 0x28]); // invalid UTF-8
    pair.right.on_chunk_received(b"WORLD");
    pair.right.on_chunk_received(b"EOM");

    let events = drain_events(&mut right_rx);
    assert_eq!(received_messages(&events), vec![b"HELLOWORLD".to_vec()]);
}
