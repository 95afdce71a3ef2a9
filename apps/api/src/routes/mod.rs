pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers::{self, MAX_CV_BYTES};
use crate::notify;
use crate::signals::handlers as signal_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route(
            "/api/v1/analysis/upload",
            post(handlers::handle_upload)
                // multipart framing overhead on top of the document limit
                .layer(DefaultBodyLimit::max(MAX_CV_BYTES + 64 * 1024)),
        )
        .route("/api/v1/analysis/text", post(handlers::handle_analyze_text))
        .route("/api/v1/analysis/history", get(handlers::handle_history))
        .route("/api/v1/analysis/stats", get(handlers::handle_stats))
        .route("/api/v1/analysis/export", get(handlers::handle_export))
        .route("/api/v1/analysis/:id", get(handlers::handle_get_analysis))
        // Recommendation API
        .route("/api/v1/recommendations", post(handlers::handle_recommend))
        // Behavioral signals
        .route(
            "/api/v1/signals/search",
            post(signal_handlers::handle_record_search),
        )
        .route(
            "/api/v1/signals/view",
            post(signal_handlers::handle_record_view),
        )
        .route(
            "/api/v1/signals/application",
            post(signal_handlers::handle_record_application),
        )
        .route("/api/v1/signals/summary", get(signal_handlers::handle_summary))
        // Notifications
        .route("/api/v1/notifications", get(notify::handle_list_unread))
        .route(
            "/api/v1/notifications/read-all",
            post(notify::handle_mark_all_read),
        )
        .route("/api/v1/devices", post(notify::handle_register_device))
        .with_state(state)
}
