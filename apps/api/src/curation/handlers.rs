//! Axum route handlers for curation sessions and stored résumés.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::extract::{resolve_reply, AssistantReply};
use crate::chat::{ChatMode, ChatRequest};
use crate::curation::pending::PendingSuggestion;
use crate::curation::session::{AcceptOutcome, ApplyAllReport, SessionSnapshot};
use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::models::suggestion::{Suggestion, SuggestionId};
use crate::parser_client::{UploadKind, UploadedFile};
use crate::render::render_resume_md;
use crate::state::AppState;
use crate::store::StoredResume;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub resume: Option<ResumeDocument>,
}

#[derive(Debug, Deserialize)]
pub struct SelectModeRequest {
    pub mode: ChatMode,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// Transcript index of the assistant reply; absent if the conversation
    /// was reset while the request was in flight.
    pub message_index: Option<usize>,
    pub message: String,
    pub pending: Vec<PendingSuggestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectResponse {
    pub id: SuggestionId,
    pub suggestion: Suggestion,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCuratedRequest {
    pub content: ResumeDocument,
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Opens a session from the given résumé, or from the user's latest stored one.
pub async fn handle_open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let resume = match req.resume {
        Some(resume) => resume,
        None => state
            .store
            .latest_resume(req.user_id)
            .await?
            .map(|stored| stored.content)
            .unwrap_or_default(),
    };
    let id = state.sessions.open(req.user_id, resume).await;
    let snapshot = state.sessions.read(id, |s| s.snapshot()).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.sessions.read(id, |s| s.snapshot()).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.close(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Résumé editing and import
// ────────────────────────────────────────────────────────────────────────────

/// PUT /api/v1/sessions/:id/resume
pub async fn handle_replace_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(resume): Json<ResumeDocument>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .sessions
        .update(id, |s| {
            s.replace_resume(resume);
            s.snapshot()
        })
        .await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/sessions/:id/resume/save
pub async fn handle_save_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredResume>, AppError> {
    let (user_id, resume) = state
        .sessions
        .read(id, |s| (s.user_id(), s.resume().clone()))
        .await?;
    Ok(Json(state.store.save_resume(user_id, &resume).await?))
}

/// POST /api/v1/sessions/:id/import/resume
pub async fn handle_import_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    import_upload(&state, id, UploadKind::Resume, multipart).await
}

/// POST /api/v1/sessions/:id/import/linkedin
pub async fn handle_import_linkedin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    import_upload(&state, id, UploadKind::LinkedInExport, multipart).await
}

async fn import_upload(
    state: &AppState,
    id: Uuid,
    kind: UploadKind,
    multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    state.sessions.read(id, |_| ()).await?;
    let file = read_upload(multipart, kind.field()).await?;
    let extracted = state.parser.parse(kind, file).await?;
    let snapshot = state
        .sessions
        .update(id, |s| {
            s.merge_extracted(extracted);
            s.snapshot()
        })
        .await?;
    info!("Imported {kind:?} into session {id}");
    Ok(Json(snapshot))
}

/// Takes the field named `field`, or the first file field if none matches.
async fn read_upload(mut multipart: Multipart, field: &str) -> Result<UploadedFile, AppError> {
    let mut fallback = None;
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let is_named = part.name() == Some(field);
        if !is_named && (fallback.is_some() || part.file_name().is_none()) {
            continue;
        }
        let file_name = part.file_name().unwrap_or("upload").to_string();
        let content_type = part.content_type().map(str::to_string);
        let data = part
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        let file = UploadedFile {
            file_name,
            content_type,
            data,
        };
        if is_named {
            return Ok(file);
        }
        fallback = Some(file);
    }
    fallback.ok_or_else(|| AppError::Validation(format!("Missing '{field}' file field")))
}

// ────────────────────────────────────────────────────────────────────────────
// Conversation
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/mode
pub async fn handle_select_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectModeRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .sessions
        .update(id, |s| {
            s.select_mode(req.mode);
            s.snapshot()
        })
        .await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/sessions/:id/chat
///
/// Upstream failures are not HTTP errors here: they become an assistant
/// message so the conversation shows what went wrong.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let (user_id, prepared) = state
        .sessions
        .update(id, |s| s.prepare_chat(&req.message).map(|p| (s.user_id(), p)))
        .await??;

    let request = ChatRequest {
        message: prepared.message,
        mode: prepared.mode,
        user_id,
        conversation_history: prepared.history,
    };

    let reply = match state.chat.send(&request).await {
        Ok(response) => resolve_reply(&response.message, response.suggestions),
        Err(e) => {
            warn!(
                "Chat request to {} failed for session {id}: {e}",
                state.config.chatbot_url
            );
            AssistantReply {
                text: format!("Error: {e}"),
                suggestions: Vec::new(),
            }
        }
    };

    let text = reply.text.clone();
    let turn = state
        .sessions
        .update(id, |s| {
            s.record_reply(prepared.epoch, reply.text, reply.suggestions)
        })
        .await?;

    Ok(Json(match turn {
        Some(turn) => SendMessageResponse {
            message_index: Some(turn.message_index),
            message: turn.content,
            pending: turn.pending,
        },
        None => SendMessageResponse {
            message_index: None,
            message: text,
            pending: Vec::new(),
        },
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Suggestions
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/suggestions/:sid/accept
pub async fn handle_accept_suggestion(
    State(state): State<AppState>,
    Path((id, suggestion_id)): Path<(Uuid, SuggestionId)>,
) -> Result<Json<AcceptOutcome>, AppError> {
    let outcome = state
        .sessions
        .update(id, |s| s.accept(suggestion_id))
        .await??;
    Ok(Json(outcome))
}

/// POST /api/v1/sessions/:id/suggestions/:sid/reject
pub async fn handle_reject_suggestion(
    State(state): State<AppState>,
    Path((id, suggestion_id)): Path<(Uuid, SuggestionId)>,
) -> Result<Json<RejectResponse>, AppError> {
    let suggestion = state
        .sessions
        .update(id, |s| s.reject(suggestion_id))
        .await??;
    Ok(Json(RejectResponse {
        id: suggestion_id,
        suggestion,
    }))
}

/// POST /api/v1/sessions/:id/suggestions/apply-all
pub async fn handle_apply_all(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplyAllReport>, AppError> {
    Ok(Json(state.sessions.update(id, |s| s.apply_all()).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Curated copy and export
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/curated/discard
pub async fn handle_discard_curated(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .sessions
        .update(id, |s| {
            s.discard_curated();
            s.snapshot()
        })
        .await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/sessions/:id/curated/commit
pub async fn handle_commit_curated(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredResume>, AppError> {
    let (user_id, curated) = state
        .sessions
        .read(id, |s| (s.user_id(), s.curated().cloned()))
        .await?;
    let curated = curated.ok_or_else(|| {
        AppError::Validation("No curated resume yet. Accept a suggestion first.".to_string())
    })?;
    Ok(Json(state.store.save_curated(user_id, &curated).await?))
}

/// GET /api/v1/sessions/:id/export
///
/// Markdown of the curated copy, or of the canonical résumé if nothing is curated.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let md = state
        .sessions
        .read(id, |s| render_resume_md(s.display_document()))
        .await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        md,
    ))
}

/// GET /api/v1/users/:user_id/curated
pub async fn handle_get_stored_curated(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StoredResume>, AppError> {
    state
        .store
        .curated_resume(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No curated resume for user {user_id}")))
}

/// PUT /api/v1/curated/:id
pub async fn handle_update_stored_curated(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCuratedRequest>,
) -> Result<Json<StoredResume>, AppError> {
    Ok(Json(state.store.update_curated(id, &req.content).await?))
}
