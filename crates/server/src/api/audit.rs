use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use governor_core::{AuditFilter, AuditRecord};
use std::sync::Arc;

use crate::state::AppState;

/// Maximum allowed limit for log queries
const MAX_LIMIT: usize = 1000;

/// Default limit for log queries
const DEFAULT_LIMIT: usize = 100;

/// Query parameters for the run-log endpoint
#[derive(Debug, Deserialize)]
pub struct LogQueryParams {
    /// Filter by ticket ID
    pub ticket_id: Option<String>,
    /// Filter by event type
    pub event_type: Option<String>,
    /// Maximum number of entries to return (default 100, max 1000)
    pub limit: Option<usize>,
}

/// Response for the run-log endpoint
#[derive(Debug, Serialize)]
pub struct LogQueryResponse {
    /// Matching entries, oldest first
    pub logs: Vec<AuditRecord>,
    /// Total number of matching entries
    pub total: usize,
    /// Limit used for this query
    pub limit: usize,
}

/// Error response for log queries
#[derive(Debug, Serialize)]
pub struct LogErrorResponse {
    pub error: String,
}

/// Query the run log
pub async fn query_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogQueryParams>,
) -> Result<Json<LogQueryResponse>, (StatusCode, Json<LogErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut filter = AuditFilter::new().with_limit(limit);

    if let Some(ref ticket_id) = params.ticket_id {
        filter = filter.with_ticket_id(ticket_id);
    }

    if let Some(ref event_type) = params.event_type {
        filter = filter.with_event_type(event_type);
    }

    let logs = state.audit_store().query(&filter).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LogErrorResponse {
                error: format!("Failed to query run log: {}", e),
            }),
        )
    })?;

    let total = state.audit_store().count(&filter).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LogErrorResponse {
                error: format!("Failed to count run log entries: {}", e),
            }),
        )
    })?;

    Ok(Json(LogQueryResponse { logs, total, limit }))
}
