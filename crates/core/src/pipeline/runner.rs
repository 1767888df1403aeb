//! Pipeline execution.

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::dicom::{BuildJob, DicomBuilder, DicomError};
use crate::fhir::{extract_parts, Bundle, ImagingDescriptor, ValidationError};
use crate::pacs::{DeliveryOutcome, PacsClient, PacsError};
use crate::task::{TaskStatus, TaskStore, TaskStoreError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("DICOM conversion failed: {0}")]
    Conversion(#[from] DicomError),

    #[error("PACS delivery failed: {0}")]
    Delivery(#[from] PacsError),

    #[error("Task store failure: {0}")]
    Storage(#[from] TaskStoreError),
}

/// Map a delivery acknowledgement to the task's terminal status. Only an
/// explicit success acknowledgement completes the task; everything else,
/// including a missing acknowledgement, fails it.
pub fn classify_outcome(outcome: Option<DeliveryOutcome>) -> TaskStatus {
    match outcome {
        Some(DeliveryOutcome::Dimse { status: 0x0000 }) => TaskStatus::Completed,
        Some(DeliveryOutcome::Wado { http_status: 200 }) => TaskStatus::Completed,
        Some(DeliveryOutcome::Dimse { .. })
        | Some(DeliveryOutcome::Wado { .. })
        | None => TaskStatus::Failed,
    }
}

/// Run one submission to its terminal status.
///
/// Never returns an error: every failure mode ends as a status write on the
/// task, with the cause in the logs. The returned status is what the run
/// settled on.
pub async fn process_bundle(
    task_id: String,
    bundle: Bundle,
    store: Arc<dyn TaskStore>,
    builder: Arc<dyn DicomBuilder>,
    pacs: Arc<dyn PacsClient>,
) -> TaskStatus {
    info!(task_id = %task_id, "Processing submission");

    if let Err(e) = store.set_status(&task_id, TaskStatus::InProgress) {
        error!(task_id = %task_id, "Cannot mark task in-progress, giving up: {}", e);
        return TaskStatus::Failed;
    }

    let status = match run_submission(&bundle, builder, pacs).await {
        Ok(status) => status,
        Err(PipelineError::Validation(e)) => {
            warn!(task_id = %task_id, "Submission rejected: {}", e);
            TaskStatus::Rejected
        }
        Err(e) => {
            error!(task_id = %task_id, "Submission failed: {}", e);
            TaskStatus::Failed
        }
    };

    if let Err(e) = store.set_status(&task_id, status) {
        error!(
            task_id = %task_id,
            "Task finished as {} but the status write failed: {}", status, e
        );
    } else {
        info!(task_id = %task_id, status = %status, "Submission finished");
    }

    status
}

async fn run_submission(
    bundle: &Bundle,
    builder: Arc<dyn DicomBuilder>,
    pacs: Arc<dyn PacsClient>,
) -> Result<TaskStatus, PipelineError> {
    let parts = extract_parts(bundle)?;
    let descriptor = ImagingDescriptor::from_study(&parts.study)?;

    let image_bytes = parts.image.decoded_data()?;
    let worklist_bytes = parts.worklist.decoded_data()?;

    let object = builder
        .build(BuildJob {
            image_bytes,
            image_content_type: parts.image.content_type.clone(),
            worklist_bytes,
            descriptor,
        })
        .await?;

    let outcome = pacs.send(&[object.to_transport_form()]).await?;

    Ok(classify_outcome(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhir::{BundleEntry, PartKind, Resource};
    use crate::task::{FhirTask, SqliteTaskStore};
    use crate::testing::{fixtures, MockDicomBuilder, MockPacsClient, ScriptedDelivery};
    use std::sync::Mutex;

    /// Store wrapper that records every status write.
    struct RecordingStore {
        inner: SqliteTaskStore,
        writes: Mutex<Vec<TaskStatus>>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                inner: SqliteTaskStore::in_memory().unwrap(),
                writes: Mutex::new(Vec::new()),
            }
        }

        fn writes(&self) -> Vec<TaskStatus> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl TaskStore for RecordingStore {
        fn create(
            &self,
            intent: &str,
            description: Option<&str>,
        ) -> Result<FhirTask, TaskStoreError> {
            self.inner.create(intent, description)
        }

        fn create_with_overwrite(&self, candidate: FhirTask) -> Result<FhirTask, TaskStoreError> {
            self.inner.create_with_overwrite(candidate)
        }

        fn get(&self, id: &str) -> Result<Option<FhirTask>, TaskStoreError> {
            self.inner.get(id)
        }

        fn list(&self) -> Result<Vec<FhirTask>, TaskStoreError> {
            self.inner.list()
        }

        fn set_status(&self, id: &str, status: TaskStatus) -> Result<FhirTask, TaskStoreError> {
            self.writes.lock().unwrap().push(status);
            self.inner.set_status(id, status)
        }

        fn teardown(&self) {
            self.inner.teardown()
        }
    }

    struct Harness {
        store: Arc<RecordingStore>,
        builder: Arc<MockDicomBuilder>,
        pacs: Arc<MockPacsClient>,
        task_id: String,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(RecordingStore::new());
            let task_id = store.create("order", None).unwrap().id;
            Self {
                store,
                builder: Arc::new(MockDicomBuilder::new()),
                pacs: Arc::new(MockPacsClient::new()),
                task_id,
            }
        }

        async fn run(&self, bundle: crate::fhir::Bundle) -> TaskStatus {
            process_bundle(
                self.task_id.clone(),
                bundle,
                Arc::clone(&self.store) as Arc<dyn TaskStore>,
                Arc::clone(&self.builder) as Arc<dyn DicomBuilder>,
                Arc::clone(&self.pacs) as Arc<dyn PacsClient>,
            )
            .await
        }

        fn stored_status(&self) -> TaskStatus {
            self.store.get(&self.task_id).unwrap().unwrap().status
        }
    }

    #[test]
    fn test_classify_outcome() {
        use DeliveryOutcome::*;
        assert_eq!(
            classify_outcome(Some(Dimse { status: 0x0000 })),
            TaskStatus::Completed
        );
        assert_eq!(
            classify_outcome(Some(Wado { http_status: 200 })),
            TaskStatus::Completed
        );
        assert_eq!(
            classify_outcome(Some(Dimse { status: 0x0110 })),
            TaskStatus::Failed
        );
        assert_eq!(
            classify_outcome(Some(Wado { http_status: 409 })),
            TaskStatus::Failed
        );
        assert_eq!(classify_outcome(None), TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_valid_submission_completes() {
        let harness = Harness::new();
        let status = harness.run(fixtures::valid_bundle()).await;

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(harness.stored_status(), TaskStatus::Completed);
        assert_eq!(
            harness.store.writes(),
            vec![TaskStatus::InProgress, TaskStatus::Completed]
        );

        let batches = harness.pacs.sent_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![fixtures::INSTANCE_UID.to_string()]);
    }

    #[tokio::test]
    async fn test_builder_receives_decoded_payloads_and_descriptor() {
        let harness = Harness::new();
        harness.run(fixtures::valid_bundle()).await;

        let jobs = harness.builder.recorded_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].image_content_type, "image/jpeg");
        assert_eq!(jobs[0].image_bytes[..2], [0xff, 0xd8]);
        assert_eq!(&jobs[0].worklist_bytes[128..132], b"DICM");
        assert_eq!(
            jobs[0].descriptor.series_uid.as_deref(),
            Some(fixtures::SERIES_UID)
        );
        assert!(jobs[0].descriptor.started.is_some());
    }

    #[tokio::test]
    async fn test_unparseable_study_timestamp_still_completes() {
        let harness = Harness::new();
        let mut bundle = fixtures::valid_bundle();
        for entry in &mut bundle.entry {
            if let Some(Resource::ImagingStudy(study)) = entry.resource.as_mut() {
                study.started = Some("yesterday at noon".to_string());
            }
        }

        assert_eq!(harness.run(bundle).await, TaskStatus::Completed);
        assert!(harness.builder.recorded_jobs()[0].descriptor.started.is_none());
    }

    #[tokio::test]
    async fn test_missing_part_rejects() {
        for kind in [PartKind::Image, PartKind::DicomWorklist, PartKind::ImagingStudy] {
            let harness = Harness::new();
            let status = harness.run(fixtures::bundle_without(kind)).await;
            assert_eq!(status, TaskStatus::Rejected);
            assert_eq!(harness.stored_status(), TaskStatus::Rejected);
            assert!(harness.builder.recorded_jobs().is_empty());
        }
    }

    #[tokio::test]
    async fn test_duplicate_part_rejects() {
        let harness = Harness::new();
        let mut bundle = fixtures::valid_bundle();
        bundle.entry.push(BundleEntry {
            resource: Some(Resource::ImagingStudy(fixtures::imaging_study())),
        });

        assert_eq!(harness.run(bundle).await, TaskStatus::Rejected);
    }

    #[tokio::test]
    async fn test_bad_base64_rejects() {
        let harness = Harness::new();
        let mut bundle = fixtures::valid_bundle();
        if let Some(Resource::Binary(binary)) = bundle.entry[0].resource.as_mut() {
            binary.data = "!!!".to_string();
        }

        assert_eq!(harness.run(bundle).await, TaskStatus::Rejected);
    }

    #[tokio::test]
    async fn test_builder_failure_fails_task() {
        let harness = Harness::new();
        harness.builder.set_failure("img2dcm exploded");

        let status = harness.run(fixtures::valid_bundle()).await;
        assert_eq!(status, TaskStatus::Failed);
        assert_eq!(harness.stored_status(), TaskStatus::Failed);
        assert!(harness.pacs.sent_batches().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_rejection_fails_task() {
        let harness = Harness::new();
        harness
            .pacs
            .set_response(ScriptedDelivery::Outcome(Some(DeliveryOutcome::Wado {
                http_status: 409,
            })));

        assert_eq!(harness.run(fixtures::valid_bundle()).await, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_missing_acknowledgement_fails_task() {
        let harness = Harness::new();
        harness.pacs.set_response(ScriptedDelivery::Outcome(None));

        assert_eq!(harness.run(fixtures::valid_bundle()).await, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_transport_error_fails_task() {
        let harness = Harness::new();
        harness
            .pacs
            .set_response(ScriptedDelivery::TransportError("connection refused".into()));

        let status = harness.run(fixtures::valid_bundle()).await;
        assert_eq!(status, TaskStatus::Failed);
        assert_eq!(harness.stored_status(), TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_wado_success_completes() {
        let harness = Harness::new();
        harness
            .pacs
            .set_response(ScriptedDelivery::Outcome(Some(DeliveryOutcome::Wado {
                http_status: 200,
            })));

        assert_eq!(
            harness.run(fixtures::valid_bundle()).await,
            TaskStatus::Completed
        );
    }
}
