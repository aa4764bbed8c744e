pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::curation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_close_session),
        )
        .route(
            "/api/v1/sessions/:id/resume",
            put(handlers::handle_replace_resume),
        )
        .route(
            "/api/v1/sessions/:id/resume/save",
            post(handlers::handle_save_resume),
        )
        .route(
            "/api/v1/sessions/:id/import/resume",
            post(handlers::handle_import_resume),
        )
        .route(
            "/api/v1/sessions/:id/import/linkedin",
            post(handlers::handle_import_linkedin),
        )
        // Conversation
        .route("/api/v1/sessions/:id/mode", post(handlers::handle_select_mode))
        .route("/api/v1/sessions/:id/chat", post(handlers::handle_send_message))
        // Suggestions
        .route(
            "/api/v1/sessions/:id/suggestions/apply-all",
            post(handlers::handle_apply_all),
        )
        .route(
            "/api/v1/sessions/:id/suggestions/:sid/accept",
            post(handlers::handle_accept_suggestion),
        )
        .route(
            "/api/v1/sessions/:id/suggestions/:sid/reject",
            post(handlers::handle_reject_suggestion),
        )
        // Curated copy
        .route(
            "/api/v1/sessions/:id/curated/discard",
            post(handlers::handle_discard_curated),
        )
        .route(
            "/api/v1/sessions/:id/curated/commit",
            post(handlers::handle_commit_curated),
        )
        .route("/api/v1/sessions/:id/export", get(handlers::handle_export))
        // Stored curated résumés
        .route(
            "/api/v1/users/:user_id/curated",
            get(handlers::handle_get_stored_curated),
        )
        .route(
            "/api/v1/curated/:id",
            put(handlers::handle_update_stored_curated),
        )
        .with_state(state)
}
