//! Error types for scrawl-core

use thiserror::Error;

/// Result type alias using scrawl-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scrawl-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transient network or provider failure, retried with backoff
    #[error("Network error: {0}")]
    Network(String),

    /// Non-transient provider failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// Authentication failure, terminal for the connection
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Encryption or decryption failure, not retried
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// No factory registered for the requested provider kind
    #[error("No provider registered for kind: {0}")]
    UnregisteredProvider(String),

    /// Operation requires an active provider connection
    #[error("Not connected to a cloud provider")]
    NotConnected,

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether a failed operation may succeed if simply retried later.
    ///
    /// Only transient network/provider failures qualify; authentication and
    /// encryption failures would fail identically on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_transient() {
        assert!(Error::Network("connection reset".to_string()).is_transient());
        assert!(!Error::Auth("expired credentials".to_string()).is_transient());
        assert!(!Error::Crypto("wrong passphrase".to_string()).is_transient());
        assert!(!Error::NotConnected.is_transient());
        assert!(!Error::Provider("bucket missing".to_string()).is_transient());
    }
}
