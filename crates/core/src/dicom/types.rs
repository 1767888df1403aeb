//! DICOM build inputs and outputs.

use crate::fhir::ImagingDescriptor;

/// Everything a [`super::DicomBuilder`] needs to assemble one object.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildJob {
    pub image_bytes: Vec<u8>,
    pub image_content_type: String,
    pub worklist_bytes: Vec<u8>,
    pub descriptor: ImagingDescriptor,
}

/// A built DICOM object, held in its encoded part 10 form.
#[derive(Debug, Clone, PartialEq)]
pub struct DicomObject {
    pub sop_instance_uid: String,
    pub series_instance_uid: String,
    pub modality: String,
    pub bytes: Vec<u8>,
}

impl DicomObject {
    /// The representation handed to a PACS transport.
    pub fn to_transport_form(&self) -> TransportDicom {
        TransportDicom {
            sop_instance_uid: self.sop_instance_uid.clone(),
            content_type: "application/dicom".to_string(),
            bytes: self.bytes.clone(),
        }
    }
}

/// A DICOM object as shipped over a PACS transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportDicom {
    pub sop_instance_uid: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
