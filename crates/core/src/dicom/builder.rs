//! The DICOM builder trait.

use async_trait::async_trait;

use super::{BuildJob, DicomError, DicomObject};

/// Builds a DICOM object out of a submission's image, worklist and study
/// descriptor. Implementations must be safe to share across tasks.
#[async_trait]
pub trait DicomBuilder: Send + Sync {
    async fn build(&self, job: BuildJob) -> Result<DicomObject, DicomError>;
}
