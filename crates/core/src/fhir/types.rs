//! FHIR resource types accepted in submission Bundles.

use base64::prelude::{Engine, BASE64_STANDARD};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// A FHIR Bundle as posted to the submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<String>,
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

/// A Bundle entry resource, discriminated by its `resourceType` field.
///
/// Resource types the pipeline does not consume decode to [`Resource::Other`]
/// instead of failing the whole submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Binary(Binary),
    ImagingStudy(ImagingStudy),
    Task(TaskEntry),
    #[serde(other)]
    Other,
}

/// A FHIR Binary resource carrying a base64 payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binary {
    pub content_type: String,
    pub data: String,
}

impl Binary {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub fn is_dicom(&self) -> bool {
        self.content_type == "application/dicom"
    }

    /// Decode the base64 payload.
    pub fn decoded_data(&self) -> Result<Vec<u8>, ValidationError> {
        BASE64_STANDARD
            .decode(&self.data)
            .map_err(|e| ValidationError::BadPayload(e.to_string()))
    }
}

/// The slice of a FHIR ImagingStudy the pipeline reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagingStudy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
    #[serde(default)]
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default)]
    pub instance: Vec<Instance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

/// A Task resource embedded in a submission Bundle. Its id and status are
/// advisory only; the store replaces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_decodes_by_resource_type() {
        let json = r#"{"resourceType":"Binary","contentType":"image/jpeg","data":"aGk="}"#;
        let resource: Resource = serde_json::from_str(json).unwrap();
        match resource {
            Resource::Binary(binary) => {
                assert!(binary.is_image());
                assert!(!binary.is_dicom());
                assert_eq!(binary.decoded_data().unwrap(), b"hi");
            }
            other => panic!("unexpected resource: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_resource_type_decodes_to_other() {
        let json = r#"{"resourceType":"Patient","name":[{"family":"Doe"}]}"#;
        let resource: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(resource, Resource::Other);
    }

    #[test]
    fn test_bundle_tolerates_missing_fields() {
        let bundle: Bundle = serde_json::from_str(r#"{"resourceType":"Bundle"}"#).unwrap();
        assert!(bundle.entry.is_empty());
        assert!(bundle.bundle_type.is_none());
    }

    #[test]
    fn test_imaging_study_decodes_series_and_instances() {
        let json = r#"{
            "resourceType": "ImagingStudy",
            "started": "2024-05-01T10:30:00+02:00",
            "series": [{
                "uid": "1.2.3",
                "number": 1,
                "instance": [{"uid": "1.2.3.4", "number": 1}]
            }]
        }"#;
        let resource: Resource = serde_json::from_str(json).unwrap();
        match resource {
            Resource::ImagingStudy(study) => {
                assert_eq!(study.series[0].uid.as_deref(), Some("1.2.3"));
                assert_eq!(study.series[0].instance[0].number, Some(1));
            }
            other => panic!("unexpected resource: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_base64_is_reported() {
        let binary = Binary {
            content_type: "image/jpeg".to_string(),
            data: "not base64!!".to_string(),
        };
        assert!(matches!(
            binary.decoded_data().unwrap_err(),
            ValidationError::BadPayload(_)
        ));
    }
}
