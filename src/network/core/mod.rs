//! Core network functionality.
//!
//! This module contains the netlink channel and the queue binding built
//! on top of it.

pub mod channel;
pub mod queue;

// Re-export commonly used types
pub use channel::Channel;
pub use queue::Queue;
