//! Preview/edit synchronization for the resume builder.
//!
//! A `BuilderSession` holds the form, the current markdown document and the
//! view state. The document is either *derived* (regenerated from the form)
//! or *overridden* (hand-edited markdown). Regeneration only runs for derived
//! documents, except when the user edits the form while on the edit tab: that
//! discards the override, which the markdown editor warns about up front.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::resume::export::render_document;
use crate::resume::form::{FieldIssue, ResumeForm};
use crate::resume::markdown::assemble;

pub const OVERRIDE_WARNING: &str = "You will lose edited markdown if you update the form data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Edit,
    Preview,
}

/// Sub-state of the preview tab: styled read-only view or raw markdown editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewMode {
    Rendered,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Derived,
    Overridden,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("You will lose edited markdown if you update the form data.")]
    AcknowledgementRequired,

    #[error("Preview mode can only be changed on the preview tab")]
    NotInPreview,

    #[error("Markdown can only be edited in the markdown editor")]
    NotEditable,

    #[error("The {0} is already in progress")]
    Busy(Operation),

    #[error("No resume builder session is open")]
    NotOpen,
}

/// Outcome of a form update, so callers can tell the user what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormUpdate {
    pub regenerated: bool,
    pub discarded_override: bool,
}

#[derive(Debug, Clone)]
pub struct BuilderSession {
    display_name: String,
    form: ResumeForm,
    tab: Tab,
    preview_mode: PreviewMode,
    source: ContentSource,
    content: String,
    /// Last persisted document; shown when the form assembles to nothing.
    saved_content: Option<String>,
}

impl BuilderSession {
    pub fn open(display_name: impl Into<String>, persisted: Option<String>) -> Self {
        let persisted = persisted.filter(|content| !content.trim().is_empty());
        let tab = if persisted.is_some() {
            Tab::Preview
        } else {
            Tab::Edit
        };

        Self {
            display_name: display_name.into(),
            form: ResumeForm::default(),
            tab,
            preview_mode: PreviewMode::Rendered,
            source: ContentSource::Derived,
            content: persisted.clone().unwrap_or_default(),
            saved_content: persisted,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn preview_mode(&self) -> PreviewMode {
        self.preview_mode
    }

    pub fn source(&self) -> ContentSource {
        self.source
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn form(&self) -> &ResumeForm {
        &self.form
    }

    /// Takes effect on the next regeneration; a document already on screen is
    /// left as it is.
    pub fn set_display_name(&mut self, display_name: &str) {
        self.display_name = display_name.to_string();
    }

    fn regenerate(&mut self) {
        let assembled = assemble(&self.form, &self.display_name);
        self.content = if assembled.is_empty() {
            self.saved_content.clone().unwrap_or_default()
        } else {
            assembled
        };
    }

    pub fn update_form(&mut self, form: ResumeForm) -> FormUpdate {
        self.form = form;

        if self.tab != Tab::Edit {
            return FormUpdate {
                regenerated: false,
                discarded_override: false,
            };
        }

        let discarded_override = self.source == ContentSource::Overridden;
        if discarded_override {
            debug!("Form edit discarded a manual markdown override");
        }
        self.source = ContentSource::Derived;
        self.regenerate();

        FormUpdate {
            regenerated: true,
            discarded_override,
        }
    }

    /// Switching to preview carries the current document over as-is. Switching
    /// back to edit regenerates a derived document; an override is kept.
    pub fn switch_tab(&mut self, tab: Tab) {
        if tab == Tab::Edit && self.source == ContentSource::Derived {
            self.regenerate();
        }
        self.tab = tab;
    }

    pub fn set_preview_mode(
        &mut self,
        mode: PreviewMode,
        acknowledged: bool,
    ) -> Result<(), SessionError> {
        if self.tab != Tab::Preview {
            return Err(SessionError::NotInPreview);
        }
        if self.preview_mode == PreviewMode::Rendered
            && mode == PreviewMode::Markdown
            && !acknowledged
        {
            return Err(SessionError::AcknowledgementRequired);
        }
        self.preview_mode = mode;
        Ok(())
    }

    pub fn edit_markdown(&mut self, content: String) -> Result<(), SessionError> {
        if self.tab != Tab::Preview || self.preview_mode != PreviewMode::Markdown {
            return Err(SessionError::NotEditable);
        }
        self.content = content;
        self.source = ContentSource::Overridden;
        Ok(())
    }

    pub fn discard_override(&mut self) {
        self.source = ContentSource::Derived;
        self.regenerate();
    }

    pub fn mark_saved(&mut self, content: &str) {
        self.saved_content = Some(content.to_string());
    }

    /// The styled document, present only while the rendered preview is showing.
    pub fn rendered_document(&self) -> Option<String> {
        (self.tab == Tab::Preview && self.preview_mode == PreviewMode::Rendered)
            .then(|| render_document(&self.content))
    }

    pub fn warning(&self) -> Option<&'static str> {
        (self.tab == Tab::Preview && self.preview_mode == PreviewMode::Markdown)
            .then_some(OVERRIDE_WARNING)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            tab: self.tab,
            preview_mode: self.preview_mode,
            source: self.source,
            content: self.content.clone(),
            warning: self.warning(),
            rendered_html: self.rendered_document(),
            issues: self.form.issues(),
        }
    }
}

/// Snapshot of a session as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub tab: Tab,
    pub preview_mode: PreviewMode,
    pub source: ContentSource,
    pub content: String,
    pub warning: Option<&'static str>,
    pub rendered_html: Option<String>,
    pub issues: Vec<FieldIssue>,
}

/// Long-running builder operations that must not overlap with themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Save,
    Export,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Save => f.write_str("save"),
            Operation::Export => f.write_str("export"),
        }
    }
}

struct OpenSession {
    session: BuilderSession,
    last_used: Instant,
}

impl OpenSession {
    fn new(session: BuilderSession) -> Self {
        Self {
            session,
            last_used: Instant::now(),
        }
    }
}

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<Uuid, OpenSession>,
    in_flight: HashSet<(Uuid, Operation)>,
}

/// In-process store of builder sessions, one per user.
/// The lock is never held across an await point.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open_count(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_open(&self, user_id: Uuid) -> bool {
        self.lock().sessions.contains_key(&user_id)
    }

    /// Inserts `session` unless one is already open for the user.
    pub fn open(&self, user_id: Uuid, session: BuilderSession) {
        self.lock()
            .sessions
            .entry(user_id)
            .or_insert_with(|| OpenSession::new(session));
    }

    /// Starts the user over with `session`, dropping whatever was open.
    pub fn replace(&self, user_id: Uuid, session: BuilderSession) {
        self.lock().sessions.insert(user_id, OpenSession::new(session));
    }

    pub fn with<R>(
        &self,
        user_id: Uuid,
        f: impl FnOnce(&mut BuilderSession) -> R,
    ) -> Result<R, SessionError> {
        let mut inner = self.lock();
        let open = inner.sessions.get_mut(&user_id).ok_or(SessionError::NotOpen)?;
        open.last_used = Instant::now();
        Ok(f(&mut open.session))
    }

    /// Drops sessions untouched for longer than `max_idle`. Sessions with a
    /// save or export in flight are kept. Returns how many were dropped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut inner = self.lock();
        let StoreInner {
            sessions,
            in_flight,
        } = &mut *inner;

        let before = sessions.len();
        sessions.retain(|user_id, open| {
            open.last_used.elapsed() <= max_idle
                || in_flight.iter().any(|(busy, _)| busy == user_id)
        });
        before - sessions.len()
    }

    /// Marks `operation` as running for the user until the returned guard drops.
    pub fn begin(&self, user_id: Uuid, operation: Operation) -> Result<InFlight, SessionError> {
        if !self.lock().in_flight.insert((user_id, operation)) {
            return Err(SessionError::Busy(operation));
        }
        Ok(InFlight {
            store: self.clone(),
            key: (user_id, operation),
        })
    }
}

/// Periodically evicts idle sessions. Runs for the life of the process.
pub async fn sweep_idle_sessions(store: SessionStore, max_idle: Duration) {
    let mut ticker = tokio::time::interval(max_idle.max(Duration::from_secs(1)) / 2);
    loop {
        ticker.tick().await;
        let evicted = store.evict_idle(max_idle);
        if evicted > 0 {
            info!("Evicted {evicted} idle resume builder session(s)");
        }
    }
}

#[must_use = "the operation is released when the guard is dropped"]
pub struct InFlight {
    store: SessionStore,
    key: (Uuid, Operation),
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.store.lock().in_flight.remove(&self.key);
    }
}
