//! Network module for packet interception and rewrite.
//!
//! This module contains the netlink message codec, the channel and queue
//! plumbing, and the per-packet processing pipeline.

pub mod codec;
pub mod core;
pub mod processing;
