use std::path::PathBuf;

use crate::plane::PlaneError;

/// Errors that can occur while reading or writing cached planes
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No cache entry exists for the requested plane
    #[error("Cache entry not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A cache file exists but is not a readable `.npy` plane
    #[error("Invalid cache file: {0}")]
    InvalidFormat(String),

    /// The cached buffer does not describe a valid plane
    #[error("Plane error: {0}")]
    PlaneError(#[from] PlaneError),
}
