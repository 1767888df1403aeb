//! PACS delivery transports.
//!
//! Two transports are supported: DIMSE C-STORE via DCMTK's `storescu` and
//! WADO-RS/STOW-RS over HTTP. Which one runs is a deployment decision made
//! in the `[pacs]` configuration section.

mod dimse;
mod wado;

pub use dimse::DimseClient;
pub use wado::WadoClient;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, PacsConfig, SendMethod};
use crate::dicom::TransportDicom;

/// What the PACS said about a delivery, tagged by the transport that
/// produced it so the two status spaces can never be confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// DIMSE C-STORE response status (0x0000 is success).
    Dimse { status: u16 },
    /// HTTP status of the STOW-RS request (200 is success).
    Wado { http_status: u16 },
}

#[derive(Debug, Error)]
pub enum PacsError {
    #[error("PACS transport error: {0}")]
    Transport(String),

    #[error("storescu not found at path: {path}")]
    ToolNotFound { path: String },

    #[error("DIMSE send timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A transport that ships DICOM objects to a PACS.
///
/// `Ok(None)` means the transport produced no acknowledgement to classify;
/// callers must not treat it as success.
#[async_trait]
pub trait PacsClient: Send + Sync {
    async fn send(&self, objects: &[TransportDicom]) -> Result<Option<DeliveryOutcome>, PacsError>;
}

/// Build the transport selected by `pacs.send_method`. The matching section
/// has already been checked by config validation, but its absence is still
/// reported as a validation error rather than a panic.
pub fn create_pacs_client(config: &PacsConfig) -> Result<Arc<dyn PacsClient>, ConfigError> {
    match config.send_method {
        SendMethod::Wado => {
            let wado = config.wado.clone().ok_or_else(|| {
                ConfigError::ValidationError("pacs.wado section is missing".to_string())
            })?;
            let client = WadoClient::new(wado)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
            Ok(Arc::new(client))
        }
        SendMethod::Dimse => {
            let dimse = config.dimse.clone().ok_or_else(|| {
                ConfigError::ValidationError("pacs.dimse section is missing".to_string())
            })?;
            Ok(Arc::new(DimseClient::new(dimse)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DimseConfig, WadoConfig};

    #[test]
    fn test_factory_picks_configured_transport() {
        let config = PacsConfig {
            send_method: SendMethod::Dimse,
            wado: None,
            dimse: Some(DimseConfig {
                aet: "PACS".to_string(),
                host: "pacs.example".to_string(),
                port: 104,
                storescu_path: "storescu".to_string(),
                timeout_secs: 60,
            }),
        };
        assert!(create_pacs_client(&config).is_ok());
    }

    #[test]
    fn test_factory_rejects_missing_section() {
        let config = PacsConfig {
            send_method: SendMethod::Wado,
            wado: None,
            dimse: None,
        };
        assert!(matches!(
            create_pacs_client(&config),
            Err(ConfigError::ValidationError(_))
        ));

        let config = PacsConfig {
            send_method: SendMethod::Wado,
            wado: Some(WadoConfig {
                url: "http://pacs.example/stow".to_string(),
                username: None,
                password: None,
                timeout_secs: 30,
            }),
            dimse: None,
        };
        assert!(create_pacs_client(&config).is_ok());
    }
}
