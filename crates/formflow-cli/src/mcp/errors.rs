//! Error handling utilities for MCP server

use formflow_core::TrackerError;
use rmcp::ErrorData;
use serde_json::json;

/// Maps a tracker error to the closest MCP error.
///
/// Caller mistakes become `invalid_params` so the client can correct the
/// call; a concurrency conflict carries `"retryable": true`.
pub fn to_mcp_error(message: &str, error: &TrackerError) -> ErrorData {
    let text = format!("{message}: {error}");
    match error {
        TrackerError::NotFound { .. } | TrackerError::SlugNotFound { .. } => {
            ErrorData::resource_not_found(text, None)
        }
        TrackerError::Validation { errors } => {
            ErrorData::invalid_params(text, Some(json!({ "field_errors": errors })))
        }
        TrackerError::IncompleteRequiredSteps { step_ids } => {
            ErrorData::invalid_params(text, Some(json!({ "step_ids": step_ids })))
        }
        TrackerError::ConcurrencyConflict { .. } => {
            ErrorData::invalid_request(text, Some(json!({ "retryable": true })))
        }
        TrackerError::InvalidInput { .. }
        | TrackerError::ProcessUnavailable { .. }
        | TrackerError::StepIncomplete { .. }
        | TrackerError::StepRequired { .. }
        | TrackerError::AlreadyCompleted { .. }
        | TrackerError::LinearOnly { .. }
        | TrackerError::ProgressClosed { .. } => ErrorData::invalid_params(text, None),
        _ => ErrorData::internal_error(text, None),
    }
}
