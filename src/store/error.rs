use zarrs::array::{ArrayCreateError, ArrayError};
use zarrs::group::GroupCreateError;
use zarrs::storage::StorageError;

use crate::plane::PixelType;

/// Errors raised by the chunked-array storage backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The store could not be opened
    #[error("Failed to open store: {0}")]
    OpenError(String),

    /// Error from the underlying key-value storage
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    /// Error creating or opening an array
    #[error("Array creation error: {0}")]
    ArrayCreateError(#[from] ArrayCreateError),

    /// Error reading or writing array data
    #[error("Array error: {0}")]
    ArrayError(#[from] ArrayError),

    /// Error creating or opening a group
    #[error("Group creation error: {0}")]
    GroupCreateError(#[from] GroupCreateError),

    /// Attribute record could not be serialized
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Array layout is unusable
    #[error("Invalid array layout: {0}")]
    InvalidLayout(String),

    /// Attributes must be a JSON object
    #[error("Invalid attributes for {group}: expected a JSON object")]
    InvalidAttributes { group: String },

    /// Write outside the array or with the wrong plane
    #[error("Invalid write to {path}: {reason}")]
    InvalidWrite { path: String, reason: String },

    /// Plane element type differs from the array's
    #[error("Array {path} holds {expected}, got a {found} plane")]
    PixelTypeMismatch {
        path: String,
        expected: PixelType,
        found: PixelType,
    },
}
