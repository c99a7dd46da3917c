use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenVerifier;
use crate::resume::export::{ExportOptions, PdfConverter};
use crate::resume::session::SessionStore;
use crate::resume::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: TokenVerifier,
    /// Resume persistence. Default: PgResumeStore.
    pub resumes: Arc<dyn ResumeStore>,
    /// HTML-to-PDF backend. Default: HttpPdfConverter pointed at PDF_CONVERTER_URL.
    pub pdf: Arc<dyn PdfConverter>,
    /// Resume builder sessions, one per signed-in user, kept in memory.
    pub sessions: SessionStore,
    pub export_options: ExportOptions,
}
