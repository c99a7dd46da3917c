//! Identity: bearer-token verification and the authenticated-user extractors.
//!
//! Session tokens are issued by the identity provider and signed with a shared
//! HS256 secret. The first authenticated request creates the local user row.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity-provider user id.
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Invalid Authorization header format")]
    InvalidHeader,

    #[error("Token verification failed: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        warn!("Rejected request: {e}");
        AppError::Unauthorized
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(decode::<Claims>(token, &self.key, &self.validation)?.claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(value: Option<&str>) -> Result<&str, AuthError> {
    let value = value.ok_or(AuthError::MissingToken)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidHeader)
}

/// Creates the user on first sight and refreshes name/email from the token.
async fn upsert_user(pool: &PgPool, claims: &Claims) -> Result<UserRow, AppError> {
    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, external_id, email, name)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (external_id) DO UPDATE
            SET email = COALESCE(EXCLUDED.email, users.email),
                name = COALESCE(EXCLUDED.name, users.name),
                updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&claims.sub)
    .bind(&claims.email)
    .bind(&claims.name)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Any authenticated user, onboarded or not.
pub struct CurrentUser(pub UserRow);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    /// Name shown in the resume header; falls back to the email address.
    pub fn display_name(&self) -> String {
        self.0
            .name
            .clone()
            .or_else(|| self.0.email.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = bearer_token(authorization)?;
        let claims = state.tokens.verify(token)?;
        let user = upsert_user(&state.db, &claims).await?;
        debug!("Authenticated user {} ({})", user.id, user.external_id);
        Ok(CurrentUser(user))
    }
}

/// An authenticated user who has completed onboarding. Everyone else is sent
/// to the onboarding flow.
pub struct OnboardedUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for OnboardedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.0.is_onboarded() {
            debug!("User {} has not completed onboarding", user.id());
            return Err(AppError::OnboardingRequired);
        }
        Ok(OnboardedUser(user))
    }
}
