//! Prelude module for convenient imports.
//!
//! Re-exports the types most callers need, allowing a single use
//! statement:
//!
//! ```rust
//! use redirq::prelude::*;
//! ```

// Error handling
pub use crate::error::{RedirqError, Result};

// Network core
pub use crate::network::core::{Channel, Queue};

// Processing pipeline
pub use crate::network::processing::{Ipv4Header, PacketContext, RedirectPolicy};

// Settings
pub use crate::settings::{CopyMode, QueueOptions, RedirectOptions, Settings};
