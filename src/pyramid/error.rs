use crate::cache::CacheError;
use crate::plane::{PixelType, PlaneIndex};
use crate::source::SourceError;
use crate::store::StoreError;

/// Errors that can occur while building a pyramid
#[derive(Debug, thiserror::Error)]
pub enum PyramidError {
    /// Plane cache read or write failed
    #[error("Cache error: {0}")]
    CacheError(#[from] CacheError),

    /// The plane source failed
    #[error("Source error: {0}")]
    SourceError(#[from] SourceError),

    /// The storage backend failed
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// The source ran out of planes before every requested plane was produced
    #[error("Plane source exhausted before plane {0}")]
    SourceExhausted(PlaneIndex),

    /// The source produced a plane other than the one requested next
    #[error("Plane source out of order: expected {expected}, got {actual}")]
    OutOfOrder {
        expected: PlaneIndex,
        actual: PlaneIndex,
    },

    /// A full-resolution plane does not have the image's shape
    #[error("Plane {index} is {height}x{width}, image planes are {expected_height}x{expected_width}")]
    PlaneShape {
        index: PlaneIndex,
        height: usize,
        width: usize,
        expected_height: usize,
        expected_width: usize,
    },

    /// A plane does not have the image's pixel type
    #[error("Plane {index} is {found}, image pixels are {expected}")]
    PixelType {
        index: PlaneIndex,
        expected: PixelType,
        found: PixelType,
    },

    /// The pyramid configuration is unusable
    #[error("Invalid pyramid configuration: {0}")]
    InvalidConfig(String),
}
