//! Command-line interface definitions and parsing

use clap::Parser;

#[derive(Parser)]
#[command(author, version, about = "Run a gattcast sender and receiver over an in-memory loopback link", long_about = None)]
pub struct Cli {
    /// Messages to queue on the sending side (repeatable)
    #[arg(short, long = "message")]
    pub messages: Vec<String>,

    /// Negotiated MTU for the link, in bytes
    #[arg(long, default_value_t = 20)]
    pub mtu: usize,

    /// Simulate this many refused sends before the transport accepts
    #[arg(long, default_value_t = 0)]
    pub backpressure: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
