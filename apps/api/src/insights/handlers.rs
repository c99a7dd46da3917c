use axum::{extract::State, Json};
use chrono::Utc;

use crate::auth::OnboardedUser;
use crate::errors::AppError;
use crate::insights::{build_dashboard, DashboardView};
use crate::models::insights::IndustryInsightRow;
use crate::state::AppState;

/// GET /api/v1/insights
pub async fn handle_get_insights(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Result<Json<DashboardView>, AppError> {
    let industry = user.0.industry.clone().unwrap_or_default();

    let row = sqlx::query_as::<_, IndustryInsightRow>(
        "SELECT * FROM industry_insights WHERE industry = $1",
    )
    .bind(&industry)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No insights available for {industry}")))?;

    Ok(Json(build_dashboard(&row, Utc::now())))
}
