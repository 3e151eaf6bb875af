use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

/// How much of each queued packet the kernel forwards to userspace.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CopyMode {
    /// Metadata and verdict only, no payload
    None,
    /// Packet metadata only
    Meta,
    /// The full packet, up to the configured range
    #[default]
    Packet,
}

impl CopyMode {
    /// The wire code carried in the parameter message.
    pub fn code(self) -> u8 {
        match self {
            CopyMode::None => 0,
            CopyMode::Meta => 1,
            CopyMode::Packet => 2,
        }
    }
}

impl std::fmt::Display for CopyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CopyMode::None => "none",
            CopyMode::Meta => "meta",
            CopyMode::Packet => "packet",
        })
    }
}

#[derive(Parser, Debug, Serialize, Deserialize, Clone)]
pub struct QueueOptions {
    /// How much of each packet the kernel copies to userspace
    #[arg(long = "copy-mode", id = "copy-mode", value_enum, default_value_t = CopyMode::Packet)]
    #[serde(default)]
    pub copy_mode: CopyMode,

    /// Maximum number of payload bytes captured per packet
    #[arg(long = "range", id = "range", default_value_t = 0xffff)]
    #[serde(default = "default_range")]
    pub range: u32,

    /// Do not request unsegmented delivery of GSO packets
    #[arg(long = "no-gso", id = "no-gso")]
    #[serde(default)]
    pub no_gso: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        QueueOptions {
            copy_mode: CopyMode::Packet,
            range: default_range(),
            no_gso: false,
        }
    }
}

fn default_range() -> u32 {
    0xffff
}
