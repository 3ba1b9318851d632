//! Gattcast CLI - loopback demonstration entry point
//!
//! Queues messages on one end of an in-memory link, drives the transfer
//! (optionally through simulated backpressure), and prints what the other
//! end reassembles.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use gattcast_core::{LinkConfig, LinkEvent, SenderState};
use gattcast_harness::{drain_events, LoopbackPair};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose);

    let messages: Vec<Vec<u8>> = if cli.messages.is_empty() {
        // Placeholder payload when nothing is given
        vec![b"dummy,data,to,be,sent".to_vec()]
    } else {
        cli.messages
            .iter()
            .map(|m| m.clone().into_bytes())
            .collect()
    };

    let config = LinkConfig {
        event_buffer_size: 4096,
        ..LinkConfig::default()
    };
    let (mut pair, mut sender_events, mut receiver_events) = LoopbackPair::new(config);

    pair.left.start()?;
    pair.right.start()?;

    info!(count = messages.len(), mtu = cli.mtu, "queueing messages");
    pair.left.enqueue(messages);

    if cli.backpressure > 0 {
        info!(refusals = cli.backpressure, "scripting transport backpressure");
        pair.left_sink().refuse_next(cli.backpressure);
    }

    pair.connect(cli.mtu);

    // Drive the link: deliver chunks, and fire the ready signal whenever a
    // refused send left the sender stalled.
    let mut ready_signals = 0;
    loop {
        pair.pump();
        let sender = pair.left.sender();
        if sender.state() == SenderState::Idle && !sender.has_pending_eom() {
            break;
        }
        ready_signals += 1;
        anyhow::ensure!(ready_signals <= cli.backpressure + 1, "link stalled");
        pair.left.on_ready_to_send();
    }
    pair.pump();

    for event in drain_events(&mut receiver_events) {
        match event {
            LinkEvent::MessageReceived { message } => {
                info!("received: {}", String::from_utf8_lossy(&message));
            }
            other => debug!(?other, "receiver event"),
        }
    }

    let sent_chunks = drain_events(&mut sender_events)
        .iter()
        .filter(|e| matches!(e, LinkEvent::ChunkSent { .. }))
        .count();
    info!(
        chunks = sent_chunks,
        ready_signals, "transfer complete"
    );

    pair.left.stop()?;
    pair.right.stop()?;
    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
