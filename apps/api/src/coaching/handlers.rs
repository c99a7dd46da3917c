use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::OnboardedUser;
use crate::coaching::{assessment_stats, AssessmentStats};
use crate::errors::AppError;
use crate::models::coaching::{AssessmentRow, CoverLetterRow};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AssessmentsResponse {
    pub assessments: Vec<AssessmentRow>,
    pub stats: AssessmentStats,
}

/// GET /api/v1/cover-letters
pub async fn handle_list_cover_letters(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<Vec<CoverLetterRow>>, AppError> {
    let letters = sqlx::query_as::<_, CoverLetterRow>(
        "SELECT * FROM cover_letters WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(letters))
}

/// GET /api/v1/assessments
pub async fn handle_list_assessments(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<AssessmentsResponse>, AppError> {
    let assessments = sqlx::query_as::<_, AssessmentRow>(
        "SELECT * FROM assessments WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user.id())
    .fetch_all(&state.db)
    .await?;

    let stats = assessment_stats(&assessments);
    Ok(Json(AssessmentsResponse { assessments, stats }))
}
