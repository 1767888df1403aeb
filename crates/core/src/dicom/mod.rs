//! DICOM object construction.
//!
//! Turns a validated submission (image payload + DICOM worklist + study
//! descriptor) into a single DICOM object ready for transport to a PACS.

mod builder;
mod img2dcm;
mod types;

pub use builder::DicomBuilder;
pub use img2dcm::{Img2DcmBuilder, Img2DcmConfig};
pub use types::{BuildJob, DicomObject, TransportDicom};

use thiserror::Error;

/// Errors that can occur while building a DICOM object.
#[derive(Debug, Error)]
pub enum DicomError {
    /// The worklist payload is not a DICOM part 10 stream.
    #[error("Worklist is not a DICOM file")]
    InvalidWorklist,

    /// The image payload format is not supported by the builder.
    #[error("Unsupported image format: {format}")]
    UnsupportedImageFormat { format: String },

    /// The conversion tool is not installed at the configured path.
    #[error("img2dcm not found at path: {path}")]
    ToolNotFound { path: String },

    /// The conversion process failed.
    #[error("DICOM build failed: {reason}")]
    BuildFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The conversion process ran too long.
    #[error("DICOM build timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while staging files for the conversion tool.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
