//! Configuration types.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::dicom::Img2DcmConfig;

/// Top-level service configuration. Only the `[pacs]` section is mandatory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub dicom: Img2DcmConfig,
    pub pacs: PacsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite task database. When unset the store runs in
    /// memory and task history is lost on restart.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DispatcherConfig {
    /// Capacity of the pending-job queue. Submissions arriving while it is
    /// full are refused.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

fn default_queue_size() -> usize {
    64
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_size: default_queue_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMethod {
    Dimse,
    Wado,
}

impl SendMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dimse => "dimse",
            Self::Wado => "wado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PacsConfig {
    pub send_method: SendMethod,
    #[serde(default)]
    pub wado: Option<WadoConfig>,
    #[serde(default)]
    pub dimse: Option<DimseConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WadoConfig {
    /// STOW-RS endpoint URL.
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_wado_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_wado_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DimseConfig {
    /// Called AE title of the PACS.
    pub aet: String,
    pub host: String,
    #[serde(default = "default_dimse_port")]
    pub port: u16,
    #[serde(default = "default_storescu_path")]
    pub storescu_path: String,
    #[serde(default = "default_dimse_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_dimse_port() -> u16 {
    104
}

fn default_storescu_path() -> String {
    "storescu".to_string()
}

fn default_dimse_timeout_secs() -> u64 {
    60
}

/// Configuration as exposed on the `/config` endpoint. Credentials are
/// reduced to presence flags.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: SanitizedServer,
    pub database: SanitizedDatabase,
    pub dispatcher: SanitizedDispatcher,
    pub pacs: SanitizedPacs,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedServer {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDatabase {
    pub path: Option<String>,
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDispatcher {
    pub queue_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPacs {
    pub send_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wado: Option<SanitizedWado>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimse: Option<SanitizedDimse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWado {
    pub url: String,
    pub credentials_configured: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDimse {
    pub aet: String,
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl Config {
    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            server: SanitizedServer {
                host: self.server.host.to_string(),
                port: self.server.port,
            },
            database: SanitizedDatabase {
                path: self
                    .database
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string()),
                in_memory: self.database.path.is_none(),
            },
            dispatcher: SanitizedDispatcher {
                queue_size: self.dispatcher.queue_size,
            },
            pacs: SanitizedPacs {
                send_method: self.pacs.send_method.as_str().to_string(),
                wado: self.pacs.wado.as_ref().map(|w| SanitizedWado {
                    url: w.url.clone(),
                    credentials_configured: w.username.is_some(),
                    timeout_secs: w.timeout_secs,
                }),
                dimse: self.pacs.dimse.as_ref().map(|d| SanitizedDimse {
                    aet: d.aet.clone(),
                    host: d.host.clone(),
                    port: d.port,
                    timeout_secs: d.timeout_secs,
                }),
            },
        }
    }
}
