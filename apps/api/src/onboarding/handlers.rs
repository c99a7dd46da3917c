use axum::{extract::State, Json};
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::onboarding::{clean_skills, industry_key, OnboardingRequest, OnboardingStatus};
use crate::state::AppState;

/// GET /api/v1/onboarding/status
pub async fn handle_status(user: CurrentUser) -> Json<OnboardingStatus> {
    Json(OnboardingStatus {
        is_onboarded: user.0.is_onboarded(),
    })
}

/// POST /api/v1/onboarding
pub async fn handle_complete(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<OnboardingRequest>,
) -> Result<Json<OnboardingStatus>, AppError> {
    let industry = industry_key(&req.industry, req.sub_industry.as_deref())?;
    if req.experience.is_some_and(|years| years < 0) {
        return Err(AppError::Validation(
            "experience cannot be negative".to_string(),
        ));
    }

    sqlx::query(
        r#"
        UPDATE users
        SET industry = $1, experience = $2, bio = $3, skills = $4, updated_at = now()
        WHERE id = $5
        "#,
    )
    .bind(&industry)
    .bind(req.experience)
    .bind(req.bio.as_deref().map(str::trim))
    .bind(clean_skills(&req.skills))
    .bind(user.id())
    .execute(&state.db)
    .await?;

    info!("User {} completed onboarding ({industry})", user.id());
    Ok(Json(OnboardingStatus { is_onboarded: true }))
}
