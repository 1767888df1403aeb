//! Core task data types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of an imaging submission task.
///
/// Statuses advance along `Draft -> Received -> InProgress` and end in
/// exactly one of `Completed`, `Failed` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Created and persisted, not yet handed to the dispatcher.
    Draft,
    /// Accepted for background processing.
    Received,
    /// The pipeline is working on it.
    InProgress,
    /// Delivered to the PACS and acknowledged.
    Completed,
    /// Processing or delivery failed.
    Failed,
    /// The submission itself was invalid.
    Rejected,
}

impl TaskStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Rejected)
    }

    /// Whether moving to `next` advances the lifecycle. Transitions never go
    /// backward and terminal statuses never change, so a late writer cannot
    /// bury a status the pipeline already advanced past.
    pub fn can_advance_to(&self, next: TaskStatus) -> bool {
        next.rank() > self.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::Received => 1,
            Self::InProgress => 2,
            Self::Completed | Self::Failed | Self::Rejected => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Received => "received",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn task_resource_type() -> String {
    "Task".to_string()
}

/// The FHIR Task representation of a submission, persisted verbatim and
/// returned to clients when they poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FhirTask {
    #[serde(rename = "resourceType", default = "task_resource_type")]
    pub resource_type: String,
    pub id: String,
    pub status: TaskStatus,
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FhirTask {
    /// A fresh draft task with a generated id.
    pub fn draft(intent: impl Into<String>, description: Option<String>) -> Self {
        Self {
            resource_type: task_resource_type(),
            id: uuid::Uuid::new_v4().to_string(),
            status: TaskStatus::Draft,
            intent: intent.into(),
            description,
        }
    }
}
