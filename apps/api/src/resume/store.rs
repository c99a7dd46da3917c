//! Persistence adapter for the finished resume document.
//!
//! One document per user, replaced wholesale on every save (last write wins).

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::resume::ResumeRow;

/// Generic message shown when a failed save carries no message of its own.
pub const SAVE_FALLBACK_MESSAGE: &str = "Failed to save resume";
pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";

const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedResume {
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for PersistedResume {
    fn from(row: ResumeRow) -> Self {
        Self {
            content: row.content,
            updated_at: row.updated_at,
        }
    }
}

/// Storage backend for resumes. Carried in `AppState` as `Arc<dyn ResumeStore>`.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn load(&self, user_id: Uuid) -> Result<Option<PersistedResume>>;

    async fn save(&self, user_id: Uuid, content: &str) -> Result<PersistedResume>;
}

/// The user-facing message for a failed save: the error's own message when it
/// has one, otherwise the generic fallback.
pub fn save_failure_message(message: &str) -> &str {
    if message.trim().is_empty() {
        SAVE_FALLBACK_MESSAGE
    } else {
        message
    }
}

/// Message for a failed upsert, keyed by Postgres SQLSTATE. Details of other
/// database errors stay in the logs.
fn upsert_failure_message(sqlstate: Option<&str>) -> &'static str {
    match sqlstate {
        Some(FOREIGN_KEY_VIOLATION) => USER_NOT_FOUND_MESSAGE,
        _ => SAVE_FALLBACK_MESSAGE,
    }
}

pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<PersistedResume>> {
        let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PersistedResume::from))
    }

    async fn save(&self, user_id: Uuid, content: &str) -> Result<PersistedResume> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (id, user_id, content)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET content = EXCLUDED.content, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let sqlstate = e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code.into_owned());
            anyhow::Error::new(e).context(upsert_failure_message(sqlstate.as_deref()))
        })?;

        info!("Saved resume for user {user_id} ({} bytes)", content.len());
        Ok(row.into())
    }
}
