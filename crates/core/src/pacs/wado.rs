//! STOW-RS delivery over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::WadoConfig;
use crate::dicom::TransportDicom;

use super::{DeliveryOutcome, PacsClient, PacsError};

pub struct WadoClient {
    client: Client,
    config: WadoConfig,
}

impl WadoClient {
    pub fn new(config: WadoConfig) -> Result<Self, PacsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PacsError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl PacsClient for WadoClient {
    async fn send(&self, objects: &[TransportDicom]) -> Result<Option<DeliveryOutcome>, PacsError> {
        let mut outcome = None;

        for object in objects {
            let mut request = self
                .client
                .post(&self.config.url)
                .header("Content-Type", &object.content_type)
                .body(object.bytes.clone());

            if let Some(username) = &self.config.username {
                request = request.basic_auth(username, self.config.password.as_deref());
            }

            let response = request
                .send()
                .await
                .map_err(|e| PacsError::Transport(e.to_string()))?;

            let http_status = response.status().as_u16();
            tracing::debug!(
                sop_instance_uid = %object.sop_instance_uid,
                http_status,
                "STOW-RS store"
            );

            // A non-success response ends the batch; the PACS already
            // refused part of it.
            if http_status != 200 {
                return Ok(Some(DeliveryOutcome::Wado { http_status }));
            }
            outcome = Some(DeliveryOutcome::Wado { http_status });
        }

        Ok(outcome)
    }
}
