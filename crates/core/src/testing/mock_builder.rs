//! Mock DICOM builder for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::dicom::{BuildJob, DicomBuilder, DicomError, DicomObject};

/// Mock implementation of the [`DicomBuilder`] trait.
///
/// Records every job it receives and either produces a canned object or
/// fails with a configured reason.
#[derive(Default)]
pub struct MockDicomBuilder {
    jobs: Mutex<Vec<BuildJob>>,
    fail_with: Mutex<Option<String>>,
}

impl MockDicomBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent build fail with this reason.
    pub fn set_failure(&self, reason: impl Into<String>) {
        *self.fail_with.lock().unwrap() = Some(reason.into());
    }

    /// Jobs received so far, in order.
    pub fn recorded_jobs(&self) -> Vec<BuildJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl DicomBuilder for MockDicomBuilder {
    async fn build(&self, job: BuildJob) -> Result<DicomObject, DicomError> {
        let descriptor = job.descriptor.clone();
        self.jobs.lock().unwrap().push(job);

        if let Some(reason) = self.fail_with.lock().unwrap().clone() {
            return Err(DicomError::BuildFailed {
                reason,
                stderr: None,
            });
        }

        Ok(DicomObject {
            sop_instance_uid: descriptor
                .instance_uid
                .unwrap_or_else(|| "2.25.1".to_string()),
            series_instance_uid: descriptor
                .series_uid
                .unwrap_or_else(|| "2.25.2".to_string()),
            modality: "XC".to_string(),
            bytes: b"mock dicom".to_vec(),
        })
    }
}
