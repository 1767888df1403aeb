//! Mock PACS client for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::dicom::TransportDicom;
use crate::pacs::{DeliveryOutcome, PacsClient, PacsError};

/// What the mock should answer to the next sends.
#[derive(Debug, Clone)]
pub enum ScriptedDelivery {
    Outcome(Option<DeliveryOutcome>),
    TransportError(String),
}

/// Mock implementation of the [`PacsClient`] trait.
///
/// Answers every send with a scripted response and records the SOP instance
/// UIDs of each delivered batch.
pub struct MockPacsClient {
    response: Mutex<ScriptedDelivery>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MockPacsClient {
    /// A mock that acknowledges everything with DIMSE success.
    pub fn new() -> Self {
        Self {
            response: Mutex::new(ScriptedDelivery::Outcome(Some(DeliveryOutcome::Dimse {
                status: 0x0000,
            }))),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn set_response(&self, response: ScriptedDelivery) {
        *self.response.lock().unwrap() = response;
    }

    /// SOP instance UIDs per delivered batch.
    pub fn sent_batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

impl Default for MockPacsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PacsClient for MockPacsClient {
    async fn send(&self, objects: &[TransportDicom]) -> Result<Option<DeliveryOutcome>, PacsError> {
        self.batches.lock().unwrap().push(
            objects
                .iter()
                .map(|o| o.sop_instance_uid.clone())
                .collect(),
        );

        match self.response.lock().unwrap().clone() {
            ScriptedDelivery::Outcome(outcome) => Ok(outcome),
            ScriptedDelivery::TransportError(reason) => Err(PacsError::Transport(reason)),
        }
    }
}
