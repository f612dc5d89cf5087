//! Error types for the Jiaodui library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`JiaoduiError`] enum.
//!
//! # Examples
//!
//! ```
//! use jiaodui::error::{JiaoduiError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(JiaoduiError::invalid_argument("fragment must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Jiaodui operations.
#[derive(Error, Debug)]
pub enum JiaoduiError {
    /// I/O errors (file operations, scorer pipes, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors, including missing or unreadable dictionaries
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failures reported by the masked-token scorer
    #[error("Scorer error: {0}")]
    Scorer(String),

    /// A scorer call exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Operation cancelled
    #[error("Operation cancelled: {0}")]
    OperationCancelled(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with JiaoduiError.
pub type Result<T> = std::result::Result<T, JiaoduiError>;

impl JiaoduiError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        JiaoduiError::Config(msg.into())
    }

    /// Create a new scorer error.
    pub fn scorer<S: Into<String>>(msg: S) -> Self {
        JiaoduiError::Scorer(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        JiaoduiError::Timeout(msg.into())
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        JiaoduiError::OperationCancelled(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        JiaoduiError::InvalidArgument(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        JiaoduiError::Other(format!("Internal error: {}", msg.into()))
    }
}
