//! Axum route handlers for the resume builder.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::OnboardedUser;
use crate::errors::AppError;
use crate::resume::form::ResumeForm;
use crate::resume::service::{
    ensure_session, export_current, reload_session, save_current, SaveResponse,
};
use crate::resume::session::{FormUpdate, PreviewMode, SessionView, Tab};
use crate::resume::store::PersistedResume;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TabRequest {
    pub tab: Tab,
}

#[derive(Debug, Deserialize)]
pub struct PreviewModeRequest {
    pub mode: PreviewMode,
    /// The user has seen the override warning.
    #[serde(default)]
    pub acknowledge: bool,
}

#[derive(Debug, Deserialize)]
pub struct MarkdownRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct FormUpdateResponse {
    pub update: FormUpdate,
    pub session: SessionView,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<Option<PersistedResume>>, AppError> {
    Ok(Json(state.resumes.load(user.id()).await?))
}

/// POST /api/v1/resume
///
/// Saves the builder's current document, replacing the stored one.
pub async fn handle_save_resume(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<SaveResponse>, AppError> {
    open(&state, &user).await?;
    Ok(Json(
        save_current(&state.sessions, state.resumes.as_ref(), user.id()).await?,
    ))
}

/// GET /api/v1/resume/session
pub async fn handle_get_session(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<SessionView>, AppError> {
    open(&state, &user).await?;
    Ok(Json(state.sessions.with(user.id(), |s| s.view())?))
}

/// POST /api/v1/resume/session
///
/// Page load: starts over from the persisted resume.
pub async fn handle_reload_session(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<SessionView>, AppError> {
    reload_session(
        &state.sessions,
        state.resumes.as_ref(),
        user.id(),
        &user.display_name(),
    )
    .await?;
    Ok(Json(state.sessions.with(user.id(), |s| s.view())?))
}

/// PUT /api/v1/resume/session/form
pub async fn handle_update_form(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
    Json(form): Json<ResumeForm>,
) -> Result<Json<FormUpdateResponse>, AppError> {
    open(&state, &user).await?;
    let (update, session) = state.sessions.with(user.id(), |s| {
        let update = s.update_form(form);
        (update, s.view())
    })?;
    Ok(Json(FormUpdateResponse { update, session }))
}

/// POST /api/v1/resume/session/tab
pub async fn handle_switch_tab(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
    Json(req): Json<TabRequest>,
) -> Result<Json<SessionView>, AppError> {
    open(&state, &user).await?;
    Ok(Json(state.sessions.with(user.id(), |s| {
        s.switch_tab(req.tab);
        s.view()
    })?))
}

/// POST /api/v1/resume/session/preview-mode
///
/// Entering the markdown editor needs `acknowledge: true`; otherwise the
/// response carries the override warning and nothing changes.
pub async fn handle_set_preview_mode(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
    Json(req): Json<PreviewModeRequest>,
) -> Result<Json<SessionView>, AppError> {
    open(&state, &user).await?;
    let view = state.sessions.with(user.id(), |s| {
        s.set_preview_mode(req.mode, req.acknowledge)
            .map(|()| s.view())
    })??;
    Ok(Json(view))
}

/// PUT /api/v1/resume/session/markdown
pub async fn handle_edit_markdown(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
    Json(req): Json<MarkdownRequest>,
) -> Result<Json<SessionView>, AppError> {
    open(&state, &user).await?;
    let view = state
        .sessions
        .with(user.id(), |s| s.edit_markdown(req.content).map(|()| s.view()))??;
    Ok(Json(view))
}

/// DELETE /api/v1/resume/session/markdown
pub async fn handle_discard_override(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<SessionView>, AppError> {
    open(&state, &user).await?;
    Ok(Json(state.sessions.with(user.id(), |s| {
        s.discard_override();
        s.view()
    })?))
}

/// POST /api/v1/resume/export
///
/// Returns the rendered preview as `resume.pdf`.
pub async fn handle_export(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Response, AppError> {
    open(&state, &user).await?;
    let pdf = export_current(
        &state.sessions,
        state.pdf.as_ref(),
        &state.export_options,
        user.id(),
    )
    .await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.export_options.filename
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

async fn open(state: &AppState, user: &crate::auth::CurrentUser) -> Result<(), AppError> {
    ensure_session(
        &state.sessions,
        state.resumes.as_ref(),
        user.id(),
        &user.display_name(),
    )
    .await
}
