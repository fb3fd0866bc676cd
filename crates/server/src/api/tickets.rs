//! Ticket API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use governor_core::{EngineError, TicketState};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<TicketState>,
    pub count: usize,
}

/// Acknowledgment for scheduled work
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: String,
    pub message: String,
    pub ticket_id: String,
}

impl AcceptedResponse {
    fn new(ticket_id: String, message: String) -> Self {
        Self {
            status: "accepted".to_string(),
            message,
            ticket_id,
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<TicketErrorResponse>);

fn engine_error(e: EngineError) -> ApiError {
    let status = match &e {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidState { .. } => StatusCode::CONFLICT,
        EngineError::Store(_) | EngineError::Source(_) => {
            error!(error = %e, "Ticket request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(TicketErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// List all tickets in insertion order
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    let tickets = state.engine().list_tickets().map_err(engine_error)?;
    Ok(Json(ListTicketsResponse {
        count: tickets.len(),
        tickets,
    }))
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketState>, ApiError> {
    state.engine().get_ticket(&id).map(Json).map_err(engine_error)
}

/// Schedule a pipeline run for a ticket
pub async fn process_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    state.engine().start_pipeline(&id).map_err(engine_error)?;

    let message = format!("Processing ticket {}", id);
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::new(id, message))))
}

/// Approve the review gate and schedule the remaining stages
pub async fn approve_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    state
        .engine()
        .approve_review(&id)
        .await
        .map_err(engine_error)?;

    let message = format!("Review approved for ticket {}", id);
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::new(id, message))))
}
