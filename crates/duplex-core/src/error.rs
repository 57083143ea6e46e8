//! Error types for the duplex matching engine.

use thiserror::Error;

/// Core error type for the matching engine workspace
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid price value
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Invalid quantity value
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(u64),

    /// Symbol not registered with the engine
    #[error("Symbol not registered: {0}")]
    SymbolNotRegistered(u64),

    /// Symbol already registered with the engine
    #[error("Symbol already registered: {0}")]
    SymbolAlreadyRegistered(u64),

    /// Engine is not running
    #[error("Matching engine is not running")]
    NotRunning,

    /// Engine is already running
    #[error("Matching engine is already running")]
    AlreadyRunning,

    /// Queue capacity exhausted
    #[error("Queue full after {0} retries")]
    QueueFull(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidPrice("negative value".to_string());
        assert_eq!(err.to_string(), "Invalid price: negative value");
    }

    #[test]
    fn test_lifecycle_errors() {
        assert_eq!(
            Error::NotRunning.to_string(),
            "Matching engine is not running"
        );
        assert_eq!(Error::SymbolNotRegistered(7).to_string(), "Symbol not registered: 7");
    }
}
