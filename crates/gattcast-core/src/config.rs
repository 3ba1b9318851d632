//! Link configuration
//!
//! Consolidates the tunable parameters of a gattcast link in one serde-ready
//! structure with sensible BLE-shaped defaults.

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Link Configuration
// ----------------------------------------------------------------------------

/// Configuration for a single gattcast link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// MTU assumed when the transport reports none (classic BLE ATT payload)
    pub default_mtu: usize,
    /// Buffer size of the upward event channel
    pub event_buffer_size: usize,
    /// Minimum signal strength (dBm) a discovered device must report before
    /// the lifecycle will connect to it
    pub min_rssi: i8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            default_mtu: 20,       // 23-byte ATT MTU minus the 3-byte header
            event_buffer_size: 64, // upward events are best-effort past this
            min_rssi: -50,         // near-field only, matching close-range sharing
        }
    }
}

impl LinkConfig {
    /// Config that connects to any discovered device regardless of signal
    pub fn unfiltered() -> Self {
        Self {
            min_rssi: i8::MIN,
            ..Self::default()
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
