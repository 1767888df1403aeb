//! DICOM builder shelling out to DCMTK's `img2dcm`.
//!
//! The worklist Binary already is a DICOM dataset; `img2dcm` encapsulates the
//! image payload as pixel data, takes the rest of the attributes from that
//! dataset and applies the study descriptor as key overrides.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::fhir::ImagingDescriptor;

use super::{BuildJob, DicomBuilder, DicomError, DicomObject};

/// Secondary capture, the modality of every object this builder produces.
const MODALITY: &str = "XC";

fn default_img2dcm_path() -> String {
    "img2dcm".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Img2DcmConfig {
    #[serde(default = "default_img2dcm_path")]
    pub img2dcm_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Img2DcmConfig {
    fn default() -> Self {
        Self {
            img2dcm_path: default_img2dcm_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub struct Img2DcmBuilder {
    config: Img2DcmConfig,
}

impl Img2DcmBuilder {
    pub fn new(config: Img2DcmConfig) -> Self {
        Self { config }
    }
}

/// A part 10 stream starts with a 128-byte preamble followed by "DICM".
fn has_dicom_preamble(bytes: &[u8]) -> bool {
    bytes.len() >= 132 && &bytes[128..132] == b"DICM"
}

/// A fresh UID in the UUID-derived root, used when the study does not name one.
fn generate_uid() -> String {
    format!("2.25.{}", uuid::Uuid::new_v4().as_u128())
}

/// `-k group,element=value` overrides applied on top of the worklist dataset.
fn build_key_args(
    descriptor: &ImagingDescriptor,
    series_uid: &str,
    sop_uid: &str,
) -> Vec<String> {
    let mut keys = vec![
        format!("0008,0060={}", MODALITY),
        format!("0008,0018={}", sop_uid),
        format!("0020,000E={}", series_uid),
    ];

    if let Some(number) = descriptor.series_number {
        keys.push(format!("0020,0011={}", number));
    }
    if let Some(number) = descriptor.instance_number {
        keys.push(format!("0020,0013={}", number));
    }
    if let Some(started) = descriptor.started {
        let date = started.format("%Y%m%d").to_string();
        let time = started.format("%H%M%S").to_string();
        keys.push(format!("0008,0020={}", date));
        keys.push(format!("0008,0030={}", time));
        keys.push(format!("0008,0021={}", date));
        keys.push(format!("0008,0031={}", time));
    }

    let mut args = Vec::with_capacity(keys.len() * 2);
    for key in keys {
        args.push("-k".to_string());
        args.push(key);
    }
    args
}

#[async_trait]
impl DicomBuilder for Img2DcmBuilder {
    async fn build(&self, job: BuildJob) -> Result<DicomObject, DicomError> {
        if !matches!(job.image_content_type.as_str(), "image/jpeg" | "image/jpg") {
            return Err(DicomError::UnsupportedImageFormat {
                format: job.image_content_type.clone(),
            });
        }
        if !has_dicom_preamble(&job.worklist_bytes) {
            return Err(DicomError::InvalidWorklist);
        }

        let series_uid = job
            .descriptor
            .series_uid
            .clone()
            .unwrap_or_else(generate_uid);
        let sop_uid = job
            .descriptor
            .instance_uid
            .clone()
            .unwrap_or_else(generate_uid);

        let staging = tempfile::tempdir()?;
        let image_path = staging.path().join("image.jpg");
        let worklist_path = staging.path().join("worklist.dcm");
        let output_path = staging.path().join("object.dcm");

        tokio::fs::write(&image_path, &job.image_bytes).await?;
        tokio::fs::write(&worklist_path, &job.worklist_bytes).await?;

        let mut command = Command::new(&self.config.img2dcm_path);
        command
            .arg(&image_path)
            .arg(&output_path)
            .arg("--dataset-from")
            .arg(&worklist_path)
            .args(build_key_args(&job.descriptor, &series_uid, &sop_uid))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            sop_instance_uid = %sop_uid,
            "Running {} on {} byte image",
            self.config.img2dcm_path,
            job.image_bytes.len()
        );

        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            command.output(),
        )
        .await
        .map_err(|_| DicomError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DicomError::ToolNotFound {
                    path: self.config.img2dcm_path.clone(),
                }
            } else {
                DicomError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(DicomError::BuildFailed {
                reason: format!("img2dcm exited with {}", output.status),
                stderr: if stderr.is_empty() { None } else { Some(stderr) },
            });
        }

        let bytes = tokio::fs::read(&output_path).await?;

        Ok(DicomObject {
            sop_instance_uid: sop_uid,
            series_instance_uid: series_uid,
            modality: MODALITY.to_string(),
            bytes,
        })
    }
}
