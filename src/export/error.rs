use crate::pyramid::PyramidError;
use crate::source::SourceError;
use crate::store::StoreError;

/// Errors that can occur while exporting images and plates
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Building an image pyramid failed
    #[error("Pyramid error: {0}")]
    PyramidError(#[from] PyramidError),

    /// The image or plate source failed
    #[error("Source error: {0}")]
    SourceError(#[from] SourceError),

    /// Writing groups or metadata failed
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// No well of the plate holds an image
    #[error("Plate {0} has no well with an image")]
    EmptyPlate(u64),

    /// Export options are unusable
    #[error("Invalid export options: {0}")]
    InvalidOptions(String),
}
