//! In-app notifications and push-delivery tokens.
//!
//! Only the rows live here — push and email transports are external
//! services fed elsewhere. "Mark all read" is a bulk scan-then-mutate
//! acceptable as eventually consistent; expired tokens are swept by the
//! maintenance task.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notify::NotificationRow;
use crate::state::AppState;

const TOKEN_TTL_DAYS: i64 = 60;

pub async fn insert_notification(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    body: &str,
) -> Result<NotificationRow, sqlx::Error> {
    sqlx::query_as::<_, NotificationRow>(
        r#"
        INSERT INTO notifications (id, user_id, title, body)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(body)
    .fetch_one(pool)
    .await
}

pub async fn list_unread(pool: &PgPool, user_id: Uuid) -> Result<Vec<NotificationRow>, sqlx::Error> {
    sqlx::query_as::<_, NotificationRow>(
        "SELECT * FROM notifications WHERE user_id = $1 AND is_read = FALSE ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Marks every unread notification read. Returns the number updated.
pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

/// Registers (or refreshes) a device token with a sliding expiry.
pub async fn register_device_token(
    pool: &PgPool,
    user_id: Uuid,
    token: &str,
    platform: &str,
) -> Result<(), sqlx::Error> {
    let expires_at = Utc::now() + Duration::days(TOKEN_TTL_DAYS);
    sqlx::query(
        r#"
        INSERT INTO device_tokens (id, user_id, token, platform, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (token) DO UPDATE
        SET user_id = EXCLUDED.user_id,
            platform = EXCLUDED.platform,
            expires_at = EXCLUDED.expires_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(token)
    .bind(platform)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub user_id: Uuid,
    pub token: String,
    pub platform: String,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked_read: u64,
}

/// GET /api/v1/notifications
pub async fn handle_list_unread(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<NotificationRow>>, AppError> {
    Ok(Json(list_unread(&state.db, params.user_id).await?))
}

/// POST /api/v1/notifications/read-all
pub async fn handle_mark_all_read(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let marked_read = mark_all_read(&state.db, params.user_id).await?;
    info!("Marked {marked_read} notifications read for user {}", params.user_id);
    Ok(Json(MarkAllReadResponse { marked_read }))
}

/// POST /api/v1/devices
pub async fn handle_register_device(
    State(state): State<AppState>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if request.token.trim().is_empty() {
        return Err(AppError::Validation("token cannot be empty".to_string()));
    }
    register_device_token(&state.db, request.user_id, &request.token, &request.platform).await?;
    Ok(Json(serde_json::json!({ "status": "registered" })))
}
