//! The dispatch loop.
//!
//! Receive one datagram, walk its netlink messages, decode each packet
//! delivery, apply the redirect policy, and answer with exactly one
//! verdict — repeated forever. Single-threaded and fully synchronous:
//! nothing is shared across loop turns and there is no shutdown path
//! beyond process termination.
//!
//! Channel failures are fatal. A malformed packet message is logged and
//! dropped without a verdict, and the loop keeps running.

use crate::error::Result;
use crate::network::codec::{
    frames, QueueMessage, NFNL_SUBSYS_QUEUE, NFQNL_MSG_PACKET, NLMSG_DONE, NLMSG_ERROR,
    NLMSG_MIN_TYPE, RECV_BUFFER_SIZE,
};
use crate::network::core::queue::Queue;
use crate::network::processing::decoder::{decode_packet, PacketContext};
use crate::network::processing::redirect::RedirectPolicy;
use crate::utils::log_statistics;
use log::{debug, error, info};
use std::time::{Duration, Instant};

/// Runs the receive, decode, inspect, verdict loop. Returns only on a
/// fatal channel error.
pub fn run(mut queue: Queue, policy: &RedirectPolicy) -> Result<()> {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    let port_id = queue.port_id();

    let log_interval = Duration::from_secs(2);
    let mut last_log_time = Instant::now();
    let mut received_count = 0usize;
    let mut verdict_count = 0usize;

    info!("Starting packet interception.");

    loop {
        let len = queue.recv(&mut buf)?;

        for item in frames(&buf[..len]) {
            let msg = match item {
                Ok(msg) => msg,
                Err(e) => {
                    error!("Skipping malformed netlink frame: {}", e);
                    break;
                }
            };

            // Messages addressed to another port are not ours.
            if msg.port_id != 0 && msg.port_id != port_id {
                debug!("Ignoring message for port {}", msg.port_id);
                continue;
            }

            match msg.msg_type {
                NLMSG_ERROR => match msg.error_code() {
                    Ok(0) => debug!("Kernel acknowledged a request"),
                    Ok(code) => error!(
                        "Kernel reported error: {}",
                        std::io::Error::from_raw_os_error(code.abs())
                    ),
                    Err(e) => error!("Unreadable kernel error message: {}", e),
                },
                NLMSG_DONE => {}
                t if t < NLMSG_MIN_TYPE => {}
                t if t >> 8 == NFNL_SUBSYS_QUEUE && t & 0xff == NFQNL_MSG_PACKET => {
                    received_count += 1;
                    match process_message(msg.body, policy) {
                        Ok(ctx) => {
                            queue.verdict(&ctx)?;
                            verdict_count += 1;
                        }
                        Err(e) => {
                            error!("Dropping malformed packet message: {}", e);
                        }
                    }
                }
                t => debug!("Ignoring message type {:#06x}", t),
            }
        }

        // Periodically log statistics
        if last_log_time.elapsed() >= log_interval {
            log_statistics(received_count, verdict_count);
            received_count = 0;
            verdict_count = 0;
            last_log_time = Instant::now();
        }
    }
}

/// Decodes one packet-delivery message body and applies the redirect
/// policy to its payload. Pure with respect to the channel, so the whole
/// per-packet path is testable without a socket.
pub fn process_message(body: &[u8], policy: &RedirectPolicy) -> Result<PacketContext> {
    let msg = QueueMessage::parse(body)?;
    let mut ctx = decode_packet(&msg)?;

    if ctx.truncated {
        debug!(
            "Packet {} truncated: {} of {:?} bytes captured",
            ctx.id,
            ctx.payload.len(),
            ctx.original_len
        );
    }
    if ctx.gso {
        debug!("Packet {} is GSO-offloaded", ctx.id);
    }
    if ctx.checksum_not_ready {
        // Checksums get corrected by kernel/hardware after the verdict.
        debug!("Packet {} checksum not ready", ctx.id);
    }

    match policy.apply(&mut ctx.payload) {
        Ok(true) => info!(
            "packet received (id={} hw=0x{:04x} hook={}, payload len {})",
            ctx.id,
            ctx.hw_protocol,
            ctx.hook,
            ctx.payload.len()
        ),
        Ok(false) => {}
        // Not inspectable (empty or non-IPv4): accept unmodified.
        Err(e) => debug!("Packet {} not inspected: {}", ctx.id, e),
    }

    Ok(ctx)
}
