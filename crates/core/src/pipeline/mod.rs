//! The submission pipeline.
//!
//! One run takes a task from `in-progress` to exactly one terminal status:
//! validate the Bundle, build the DICOM object, deliver it, classify the
//! acknowledgement.

mod runner;

pub use runner::{classify_outcome, process_bundle, PipelineError};
