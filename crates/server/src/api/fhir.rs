//! FHIR API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

use fhirbridge_core::{
    fhir::{Bundle, OperationOutcome, Resource},
    pipeline::process_bundle,
    task::{FhirTask, TaskStatus},
    DispatchError,
};

use crate::state::AppState;

const DEFAULT_INTENT: &str = "order";
const DEFAULT_DESCRIPTION: &str = "Processing Bundle";

/// Response for listing tasks
#[derive(Serialize)]
struct SearchSetBundle {
    #[serde(rename = "resourceType")]
    resource_type: &'static str,
    #[serde(rename = "type")]
    bundle_type: &'static str,
    total: usize,
    entry: Vec<SearchSetEntry>,
}

#[derive(Serialize)]
struct SearchSetEntry {
    resource: FhirTask,
}

fn outcome(status: StatusCode, outcome: OperationOutcome) -> Response {
    (status, Json(outcome)).into_response()
}

/// Accept a submission Bundle. The task is persisted before the response is
/// written, so the returned id is immediately pollable; processing happens
/// in the background.
pub async fn submit_bundle(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let bundle: Bundle = match serde_json::from_value(body) {
        Ok(bundle) => bundle,
        Err(e) => {
            return outcome(
                StatusCode::BAD_REQUEST,
                OperationOutcome::invalid(format!("Malformed Bundle: {e}")),
            );
        }
    };

    // A Task entry in the Bundle is advisory: its description and intent are
    // kept, its id and status are replaced by the store.
    let embedded = bundle.entry.iter().find_map(|entry| {
        if let Some(Resource::Task(task)) = entry.resource.as_ref() {
            Some(task.clone())
        } else {
            None
        }
    });

    let candidate = FhirTask {
        resource_type: "Task".to_string(),
        id: embedded
            .as_ref()
            .and_then(|t| t.id.clone())
            .unwrap_or_default(),
        status: TaskStatus::Draft,
        intent: embedded
            .as_ref()
            .and_then(|t| t.intent.clone())
            .unwrap_or_else(|| DEFAULT_INTENT.to_string()),
        description: Some(
            embedded
                .and_then(|t| t.description)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        ),
    };

    let task = match state.task_store().create_with_overwrite(candidate) {
        Ok(task) => task,
        Err(e) => {
            error!("Failed to persist task: {}", e);
            return outcome(
                StatusCode::INTERNAL_SERVER_ERROR,
                OperationOutcome::exception("Failed to persist task"),
            );
        }
    };

    let job = {
        let task_id = task.id.clone();
        let store = state.task_store();
        let builder = state.dicom_builder();
        let pacs = state.pacs_client();
        async move {
            process_bundle(task_id, bundle, store, builder, pacs).await;
        }
    };

    if let Err(e) = state.dispatcher().submit(job) {
        warn!(task_id = %task.id, "Submission refused: {}", e);
        let status = match e {
            DispatchError::QueueFull | DispatchError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        };
        return outcome(
            status,
            OperationOutcome::exception("Service is not accepting submissions right now"),
        );
    }

    // Mark the task received now that the dispatcher has it. The store drops
    // non-advancing writes, so even if the job already ran this can never
    // bury a status the pipeline wrote.
    if let Err(e) = state.task_store().set_status(&task.id, TaskStatus::Received) {
        error!(task_id = %task.id, "Failed to mark task received: {}", e);
    }

    // The response carries the representation captured at creation.
    (StatusCode::OK, Json(task)).into_response()
}

pub async fn get_task(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.task_store().get(&id) {
        Ok(Some(task)) => (StatusCode::OK, Json(task)).into_response(),
        Ok(None) => outcome(
            StatusCode::NOT_FOUND,
            OperationOutcome::not_found(format!("Task {id} not found")),
        ),
        Err(e) => {
            error!(task_id = %id, "Failed to read task: {}", e);
            outcome(
                StatusCode::INTERNAL_SERVER_ERROR,
                OperationOutcome::exception("Failed to read task"),
            )
        }
    }
}

pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Response {
    match state.task_store().list() {
        Ok(tasks) => {
            let body = SearchSetBundle {
                resource_type: "Bundle",
                bundle_type: "searchset",
                total: tasks.len(),
                entry: tasks
                    .into_iter()
                    .map(|resource| SearchSetEntry { resource })
                    .collect(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!("Failed to list tasks: {}", e);
            outcome(
                StatusCode::INTERNAL_SERVER_ERROR,
                OperationOutcome::exception("Failed to list tasks"),
            )
        }
    }
}
