//! # Storage Error Types
//!
//! Only configuration and construction can fail. Everything on the hot path
//! reports a logical miss through `bool`/`Option`, and handle misuse is a
//! debug assertion.

use thiserror::Error;

/// Errors that can occur while configuring storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration text could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    ConfigIo(String),

    /// A component payload does not fit in a single data page.
    #[error("element of {size} bytes does not fit in a {page_bytes}-byte data page")]
    ElementTooLarge {
        /// Requested element size.
        size: usize,
        /// Configured data page size.
        page_bytes: usize,
    },

    /// A payload set was created for a zero-sized element.
    #[error("zero-sized elements need a tag set, not a payload set")]
    ZeroSizedElement,
}

/// Result type for storage construction.
pub type StorageResult<T> = Result<T, StorageError>;
