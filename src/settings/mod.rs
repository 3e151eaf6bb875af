//! Settings module for queue and redirect configuration.
//!
//! Options are grouped by concern into clap option structs and aggregated
//! into [`Settings`], which can also be loaded from a TOML file via
//! `--config`. Settings are created once at startup and immutable for the
//! process's lifetime.

use crate::error::{RedirqError, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub mod queue;
pub mod redirect;

// Re-export commonly used types
pub use queue::{CopyMode, QueueOptions};
pub use redirect::RedirectOptions;

/// All tunable behavior except the queue number itself.
#[derive(Parser, Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Controls the kernel-side queue configuration
    #[command(flatten)]
    #[serde(default)]
    pub queue: QueueOptions,

    /// Controls the redirect rule and verdict annotation
    #[command(flatten)]
    #[serde(default)]
    pub redirect: RedirectOptions,
}

impl Settings {
    /// Loads settings from a TOML file, replacing any command-line flag
    /// values.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| RedirqError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.queue.copy_mode, CopyMode::Packet);
        assert_eq!(settings.queue.range, 0xffff);
        assert!(!settings.queue.no_gso);
        assert_eq!(settings.redirect.mark, 42);
        assert_eq!(
            settings.redirect.redirect_to,
            Ipv4Addr::new(192, 168, 199, 189)
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = Settings::default();
        settings.queue.no_gso = true;
        settings.redirect.local_addr = Ipv4Addr::new(10, 0, 0, 2);
        settings.redirect.mark = 7;

        let text = toml::to_string(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed.queue.no_gso, settings.queue.no_gso);
        assert_eq!(parsed.redirect.local_addr, settings.redirect.local_addr);
        assert_eq!(parsed.redirect.mark, 7);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed: Settings =
            toml::from_str("[redirect]\nredirect_to = \"10.1.2.3\"\n").unwrap();
        assert_eq!(parsed.redirect.redirect_to, Ipv4Addr::new(10, 1, 2, 3));
        assert_eq!(parsed.redirect.mark, 42);
        assert_eq!(parsed.queue.range, 0xffff);
    }
}
