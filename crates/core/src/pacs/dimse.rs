//! DIMSE C-STORE delivery via DCMTK's `storescu`.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::config::DimseConfig;
use crate::dicom::TransportDicom;

use super::{DeliveryOutcome, PacsClient, PacsError};

/// C-STORE success.
const STATUS_SUCCESS: u16 = 0x0000;
/// C-STORE processing failure, reported when storescu exits non-zero.
const STATUS_PROCESSING_FAILURE: u16 = 0x0110;

pub struct DimseClient {
    config: DimseConfig,
}

impl DimseClient {
    pub fn new(config: DimseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PacsClient for DimseClient {
    async fn send(&self, objects: &[TransportDicom]) -> Result<Option<DeliveryOutcome>, PacsError> {
        if objects.is_empty() {
            return Ok(None);
        }

        // storescu reads files, so the batch is staged on disk first.
        let staging = tempfile::tempdir()?;
        let mut paths = Vec::with_capacity(objects.len());
        for (index, object) in objects.iter().enumerate() {
            let path = staging.path().join(format!("{index}.dcm"));
            tokio::fs::write(&path, &object.bytes).await?;
            paths.push(path);
        }

        let mut command = Command::new(&self.config.storescu_path);
        command
            .arg("-aec")
            .arg(&self.config.aet)
            .arg(&self.config.host)
            .arg(self.config.port.to_string())
            .args(&paths)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            aet = %self.config.aet,
            host = %self.config.host,
            port = self.config.port,
            "Sending {} object(s) via C-STORE",
            objects.len()
        );

        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            command.output(),
        )
        .await
        .map_err(|_| PacsError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PacsError::ToolNotFound {
                    path: self.config.storescu_path.clone(),
                }
            } else {
                PacsError::Io(e)
            }
        })?;

        let status = if output.status.success() {
            STATUS_SUCCESS
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                "storescu exited with {}: {}",
                output.status,
                stderr.trim()
            );
            STATUS_PROCESSING_FAILURE
        };

        Ok(Some(DeliveryOutcome::Dimse { status }))
    }
}
