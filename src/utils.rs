//! Utility functions for packet processing.
//!
//! This module contains shared utility functions used throughout the application.

use log::info;

/// Logs packet statistics: received count, verdict count, and the share of
/// messages skipped as malformed.
pub fn log_statistics(received: usize, verdicted: usize) {
    let skipped = received.saturating_sub(verdicted);
    let skipped_percentage = if received == 0 {
        0.0
    } else {
        (skipped as f64 / received as f64) * 100.0
    };

    info!(
        "Received Packets: {}, Verdicts Sent: {}, Skipped Packets: {} - {:.2}%",
        received, verdicted, skipped, skipped_percentage
    );
}
