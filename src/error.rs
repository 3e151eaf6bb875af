use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedirqError {
    /// Error from a netlink channel operation (open/bind/send/receive)
    #[error("channel {op} failed: {source}")]
    Channel {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Error when an inbound queue message is malformed
    #[error("malformed queue message: {0}")]
    Parse(String),

    /// Error when a configuration file cannot be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient Result type alias using `RedirqError`.
pub type Result<T> = std::result::Result<T, RedirqError>;

impl RedirqError {
    /// Creates a channel error for `op` from the calling thread's last OS error.
    pub fn channel(op: &'static str) -> Self {
        Self::Channel {
            op,
            source: std::io::Error::last_os_error(),
        }
    }

    /// Creates a new parse error with a descriptive message.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
