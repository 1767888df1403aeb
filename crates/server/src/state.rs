use std::sync::Arc;

use fhirbridge_core::{
    Config, DicomBuilder, Dispatcher, PacsClient, SanitizedConfig, TaskStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    task_store: Arc<dyn TaskStore>,
    dicom_builder: Arc<dyn DicomBuilder>,
    pacs_client: Arc<dyn PacsClient>,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        config: Config,
        task_store: Arc<dyn TaskStore>,
        dicom_builder: Arc<dyn DicomBuilder>,
        pacs_client: Arc<dyn PacsClient>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            task_store,
            dicom_builder,
            pacs_client,
            dispatcher,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        self.config.sanitized()
    }

    pub fn task_store(&self) -> Arc<dyn TaskStore> {
        Arc::clone(&self.task_store)
    }

    pub fn dicom_builder(&self) -> Arc<dyn DicomBuilder> {
        Arc::clone(&self.dicom_builder)
    }

    pub fn pacs_client(&self) -> Arc<dyn PacsClient> {
        Arc::clone(&self.pacs_client)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
