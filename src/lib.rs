//! # Redirq - a userspace NFQUEUE redirect filter
//!
//! Redirq services one kernel NFQUEUE packet queue: every IPv4 packet a
//! firewall rule diverts to the queue is inspected in userspace, traffic
//! not originating from the configured local address gets its destination
//! rewritten to a fixed target, and an accept verdict (annotated with a
//! conntrack mark) returns the packet to the network stack.
//!
//! ## Architecture
//!
//! * `network::codec` - builds and parses the nfnetlink wire format
//! * `network::core` - the netlink channel and the queue binding
//! * `network::processing` - packet decoding, the redirect rule, and the
//!   dispatch loop
//! * `settings` - CLI and TOML configuration
//!
//! The loop is single-threaded and fully synchronous: one blocking
//! receive, one decode, at most one rewrite, exactly one verdict.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use redirq::prelude::*;
//!
//! let settings = Settings::default();
//! let mut channel = Channel::open()?;
//! channel.bind()?;
//! let mut queue = Queue::new(channel, 0, settings.redirect.mark);
//! queue.configure(&settings.queue)?;
//! ```

/// Centralized error handling
pub mod error;
/// Netlink codec, channel, and packet processing
pub mod network;
/// Prelude for convenient imports
pub mod prelude;
/// Queue and redirect configuration
pub mod settings;
/// Shared utility functions
pub mod utils;

// Re-export commonly used types
pub use error::{RedirqError, Result};
