//! Minimal FHIR model for imaging submissions.
//!
//! Only the resources the submission pipeline actually consumes are modeled;
//! everything else decodes into [`Resource::Other`] and is ignored.

mod bundle;
mod outcome;
mod types;

pub use bundle::{extract_parts, BundleParts, ImagingDescriptor, PartKind, ValidationError};
pub use outcome::{OperationOutcome, OutcomeIssue};
pub use types::{Binary, Bundle, BundleEntry, ImagingStudy, Instance, Resource, Series, TaskEntry};
