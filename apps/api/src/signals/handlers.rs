//! Axum route handlers for behavioral signals.
//!
//! Recording endpoints always answer 204: a failed insert is an analytics
//! loss, never an error the client should see or retry.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::signals::{self, JobEvent, PreferenceSummary, SearchEvent};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// POST /api/v1/signals/search
pub async fn handle_record_search(
    State(state): State<AppState>,
    Json(event): Json<SearchEvent>,
) -> StatusCode {
    signals::record_search(&state.db, &event).await;
    StatusCode::NO_CONTENT
}

/// POST /api/v1/signals/view
pub async fn handle_record_view(
    State(state): State<AppState>,
    Json(event): Json<JobEvent>,
) -> StatusCode {
    signals::record_view(&state.db, &event).await;
    StatusCode::NO_CONTENT
}

/// POST /api/v1/signals/application
pub async fn handle_record_application(
    State(state): State<AppState>,
    Json(event): Json<JobEvent>,
) -> StatusCode {
    signals::record_application(&state.db, &event).await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/signals/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<PreferenceSummary>, AppError> {
    let summary = signals::summarize(&state.db, params.user_id)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(summary))
}
