//! Per-packet processing pipeline: decode, inspect, rewrite, dispatch.

pub mod decoder;
pub mod processor;
pub mod redirect;

// Re-export commonly used types
pub use decoder::PacketContext;
pub use redirect::{Ipv4Header, RedirectPolicy};
