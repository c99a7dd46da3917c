//! Builder operations shared by the HTTP handlers: session bootstrap, save and
//! export. Each long-running operation holds an in-flight marker for its
//! duration so a second request of the same kind is refused, not queued.

use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::export::{export_pdf, ExportOptions, PdfConverter};
use crate::resume::session::{BuilderSession, Operation, SessionStore};
use crate::resume::store::{PersistedResume, ResumeStore};
use crate::resume::Notification;

pub const SAVE_SUCCESS_MESSAGE: &str = "Resume saved successfully!";

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub resume: PersistedResume,
    pub notification: Notification,
}

/// Opens the user's builder session on first use, seeded with the persisted
/// resume. An open session picks up the user's current display name.
pub async fn ensure_session(
    sessions: &SessionStore,
    store: &dyn ResumeStore,
    user_id: Uuid,
    display_name: &str,
) -> Result<(), AppError> {
    if sessions
        .with(user_id, |session| session.set_display_name(display_name))
        .is_ok()
    {
        return Ok(());
    }

    let session = load_session(store, user_id, display_name).await?;
    sessions.open(user_id, session);
    Ok(())
}

/// Starts a fresh session from the persisted resume, as on a page load. Any
/// open session for the user is discarded, unsaved edits included.
pub async fn reload_session(
    sessions: &SessionStore,
    store: &dyn ResumeStore,
    user_id: Uuid,
    display_name: &str,
) -> Result<(), AppError> {
    let session = load_session(store, user_id, display_name).await?;
    sessions.replace(user_id, session);
    Ok(())
}

async fn load_session(
    store: &dyn ResumeStore,
    user_id: Uuid,
    display_name: &str,
) -> Result<BuilderSession, AppError> {
    let persisted = store.load(user_id).await?.map(|resume| resume.content);
    info!(
        "Opening resume builder for user {user_id} (persisted: {})",
        persisted.is_some()
    );
    Ok(BuilderSession::open(display_name, persisted))
}

/// Persists the session's current document, replacing any earlier one.
pub async fn save_current(
    sessions: &SessionStore,
    store: &dyn ResumeStore,
    user_id: Uuid,
) -> Result<SaveResponse, AppError> {
    let _in_flight = sessions.begin(user_id, Operation::Save)?;
    let content = sessions.with(user_id, |session| session.content().to_string())?;

    let resume = store.save(user_id, &content).await.map_err(|e| {
        warn!("Saving resume for user {user_id} failed: {e:#}");
        AppError::SaveFailed(e.to_string())
    })?;

    sessions.with(user_id, |session| session.mark_saved(&resume.content))?;

    Ok(SaveResponse {
        resume,
        notification: Notification::success(SAVE_SUCCESS_MESSAGE),
    })
}

/// Converts the currently rendered preview into a PDF.
pub async fn export_current(
    sessions: &SessionStore,
    converter: &dyn PdfConverter,
    options: &ExportOptions,
    user_id: Uuid,
) -> Result<Bytes, AppError> {
    let _in_flight = sessions.begin(user_id, Operation::Export)?;
    let rendered = sessions.with(user_id, |session| session.rendered_document())?;

    let pdf = export_pdf(rendered.as_deref(), converter, options).await?;
    info!("Exported resume PDF for user {user_id}");
    Ok(pdf)
}
