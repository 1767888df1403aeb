//! FHIR OperationOutcome, the error body for every non-2xx API response.

use serde::{Deserialize, Serialize};

fn outcome_resource_type() -> String {
    "OperationOutcome".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    #[serde(rename = "resourceType", default = "outcome_resource_type")]
    pub resource_type: String,
    pub issue: Vec<OutcomeIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeIssue {
    pub severity: String,
    pub code: String,
    pub diagnostics: String,
}

impl OperationOutcome {
    pub fn error(code: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self {
            resource_type: outcome_resource_type(),
            issue: vec![OutcomeIssue {
                severity: "error".to_string(),
                code: code.into(),
                diagnostics: diagnostics.into(),
            }],
        }
    }

    /// The submission was malformed.
    pub fn invalid(diagnostics: impl Into<String>) -> Self {
        Self::error("invalid", diagnostics)
    }

    /// The requested resource does not exist.
    pub fn not_found(diagnostics: impl Into<String>) -> Self {
        Self::error("not-found", diagnostics)
    }

    /// An internal failure; details stay in the logs.
    pub fn exception(diagnostics: impl Into<String>) -> Self {
        Self::error("exception", diagnostics)
    }
}
