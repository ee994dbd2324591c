use crate::cache::CacheError;
use crate::plane::{PixelType, PlaneIndex};

/// Errors that can occur while reading images and planes
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing a descriptor file
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error decoding a plane file
    #[error("Plane decode error: {0}")]
    DecodeError(#[from] CacheError),

    /// Descriptor is inconsistent or incomplete
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// A plane does not match the image it belongs to
    #[error("Plane {index} is {found_height}x{found_width} {found_type}, image is {height}x{width} {pixel_type}")]
    PlaneMismatch {
        index: PlaneIndex,
        height: usize,
        width: usize,
        pixel_type: PixelType,
        found_height: usize,
        found_width: usize,
        found_type: PixelType,
    },

    /// The source cannot produce planes
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}
