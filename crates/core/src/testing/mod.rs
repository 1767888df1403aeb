//! Mock implementations and fixtures for tests.
//!
//! The mocks stand in for the two external collaborators (DICOM conversion
//! and PACS delivery) so pipeline and API behavior can be tested without
//! DCMTK or a PACS on the machine.

mod mock_builder;
mod mock_pacs;

pub use mock_builder::MockDicomBuilder;
pub use mock_pacs::{MockPacsClient, ScriptedDelivery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use base64::prelude::{Engine, BASE64_STANDARD};

    use crate::fhir::{
        Binary, Bundle, BundleEntry, ImagingStudy, Instance, PartKind, Resource, Series,
    };

    pub const SERIES_UID: &str = "1.2.840.99999.1.2";
    pub const INSTANCE_UID: &str = "1.2.840.99999.1.2.3";

    /// A tiny JPEG-flavored payload; mocks never decode it.
    pub fn image_binary() -> Binary {
        Binary {
            content_type: "image/jpeg".to_string(),
            data: BASE64_STANDARD.encode([0xffu8, 0xd8, 0xff, 0xe0, 0x00, 0x10]),
        }
    }

    /// A minimal part 10 stream: 128-byte preamble plus the DICM magic.
    pub fn worklist_binary() -> Binary {
        let mut bytes = vec![0u8; 132];
        bytes[128..132].copy_from_slice(b"DICM");
        Binary {
            content_type: "application/dicom".to_string(),
            data: BASE64_STANDARD.encode(bytes),
        }
    }

    pub fn imaging_study() -> ImagingStudy {
        ImagingStudy {
            started: Some("2024-05-01T10:30:00+02:00".to_string()),
            series: vec![Series {
                uid: Some(SERIES_UID.to_string()),
                number: Some(1),
                instance: vec![Instance {
                    uid: Some(INSTANCE_UID.to_string()),
                    number: Some(1),
                }],
            }],
        }
    }

    /// A complete, valid submission Bundle.
    pub fn valid_bundle() -> Bundle {
        Bundle {
            bundle_type: Some("transaction".to_string()),
            entry: vec![
                BundleEntry {
                    resource: Some(Resource::Binary(image_binary())),
                },
                BundleEntry {
                    resource: Some(Resource::Binary(worklist_binary())),
                },
                BundleEntry {
                    resource: Some(Resource::ImagingStudy(imaging_study())),
                },
            ],
        }
    }

    /// A Bundle with one required kind removed.
    pub fn bundle_without(kind: PartKind) -> Bundle {
        let mut bundle = valid_bundle();
        bundle.entry.retain(|entry| match (kind, entry.resource.as_ref()) {
            (PartKind::Image, Some(Resource::Binary(b))) => !b.is_image(),
            (PartKind::DicomWorklist, Some(Resource::Binary(b))) => !b.is_dicom(),
            (PartKind::ImagingStudy, Some(Resource::ImagingStudy(_))) => false,
            _ => true,
        });
        bundle
    }

    /// The valid Bundle as posted JSON, with an embedded Task entry.
    pub fn valid_bundle_json() -> serde_json::Value {
        let mut bundle = serde_json::to_value(valid_bundle()).unwrap();
        bundle["resourceType"] = "Bundle".into();
        bundle["entry"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({
                "resource": {
                    "resourceType": "Task",
                    "id": "client-supplied-id",
                    "status": "requested",
                    "intent": "order",
                    "description": "Intraoral series for patient 42"
                }
            }));
        bundle
    }
}
