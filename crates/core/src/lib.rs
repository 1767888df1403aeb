pub mod config;
pub mod dicom;
pub mod dispatcher;
pub mod fhir;
pub mod pacs;
pub mod pipeline;
pub mod task;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    SendMethod,
};
pub use dicom::{DicomBuilder, DicomError, DicomObject, Img2DcmBuilder, Img2DcmConfig};
pub use dispatcher::{DispatchError, DispatchWorker, Dispatcher};
pub use fhir::{Bundle, OperationOutcome};
pub use pacs::{create_pacs_client, DeliveryOutcome, PacsClient, PacsError};
pub use pipeline::process_bundle;
pub use task::{FhirTask, SqliteTaskStore, TaskStatus, TaskStore, TaskStoreError};
