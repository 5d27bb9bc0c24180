//! Common error types for SoilScan

use thiserror::Error;

/// Common result type for SoilScan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the SoilScan crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// History store read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Import payload does not decode to an ordered record list
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
