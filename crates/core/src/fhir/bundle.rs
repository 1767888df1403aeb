//! Bundle validation and part extraction.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::{Binary, Bundle, ImagingStudy, Resource};

/// The three resource kinds a submission Bundle must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Image,
    DicomWorklist,
    ImagingStudy,
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image Binary",
            Self::DicomWorklist => "DICOM Binary",
            Self::ImagingStudy => "ImagingStudy",
        };
        f.write_str(name)
    }
}

/// A submission fault. All variants describe invalid input, never an
/// internal failure, so the pipeline maps them to a rejection.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Bundle entry has no resource")]
    EmptyEntry,

    #[error("Bundle has no {0} entry")]
    MissingPart(PartKind),

    #[error("Bundle has more than one {0} entry")]
    AmbiguousPart(PartKind),

    #[error("ImagingStudy has no series")]
    NoSeries,

    #[error("ImagingStudy series has no instance")]
    NoInstance,

    #[error("Binary data is not valid base64: {0}")]
    BadPayload(String),
}

/// The resources a valid submission Bundle decomposes into.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleParts {
    pub image: Binary,
    pub worklist: Binary,
    pub study: ImagingStudy,
}

/// Pull exactly one image Binary, one DICOM Binary and one ImagingStudy out
/// of the Bundle. A missing kind and a duplicated kind are reported as
/// distinct faults; extra resources of other kinds are ignored.
pub fn extract_parts(bundle: &Bundle) -> Result<BundleParts, ValidationError> {
    let mut image: Option<&Binary> = None;
    let mut worklist: Option<&Binary> = None;
    let mut study: Option<&ImagingStudy> = None;

    for entry in &bundle.entry {
        let resource = entry.resource.as_ref().ok_or(ValidationError::EmptyEntry)?;
        match resource {
            Resource::Binary(binary) if binary.is_image() => {
                claim(&mut image, binary, PartKind::Image)?;
            }
            Resource::Binary(binary) if binary.is_dicom() => {
                claim(&mut worklist, binary, PartKind::DicomWorklist)?;
            }
            Resource::ImagingStudy(imaging_study) => {
                claim(&mut study, imaging_study, PartKind::ImagingStudy)?;
            }
            _ => {}
        }
    }

    Ok(BundleParts {
        image: image
            .ok_or(ValidationError::MissingPart(PartKind::Image))?
            .clone(),
        worklist: worklist
            .ok_or(ValidationError::MissingPart(PartKind::DicomWorklist))?
            .clone(),
        study: study
            .ok_or(ValidationError::MissingPart(PartKind::ImagingStudy))?
            .clone(),
    })
}

fn claim<'a, T>(
    slot: &mut Option<&'a T>,
    value: &'a T,
    kind: PartKind,
) -> Result<(), ValidationError> {
    if slot.replace(value).is_some() {
        return Err(ValidationError::AmbiguousPart(kind));
    }
    Ok(())
}

/// Study metadata copied onto the DICOM object being built: identifiers of
/// the first series and its first instance, plus the study timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagingDescriptor {
    pub series_uid: Option<String>,
    pub series_number: Option<u32>,
    pub instance_uid: Option<String>,
    pub instance_number: Option<u32>,
    pub started: Option<DateTime<FixedOffset>>,
}

impl ImagingDescriptor {
    /// Read the descriptor from an ImagingStudy. The study must have at
    /// least one series with at least one instance; identifier fields are
    /// optional and a `started` value that does not parse becomes `None`.
    pub fn from_study(study: &ImagingStudy) -> Result<Self, ValidationError> {
        let series = study.series.first().ok_or(ValidationError::NoSeries)?;
        let instance = series.instance.first().ok_or(ValidationError::NoInstance)?;

        let started = study.started.as_deref().and_then(|raw| {
            match DateTime::parse_from_rfc3339(raw) {
                Ok(dt) => Some(dt),
                Err(e) => {
                    tracing::warn!("Ignoring unparseable ImagingStudy.started {:?}: {}", raw, e);
                    None
                }
            }
        });

        Ok(Self {
            series_uid: series.uid.clone(),
            series_number: series.number,
            instance_uid: instance.uid.clone(),
            instance_number: instance.number,
            started,
        })
    }
}
