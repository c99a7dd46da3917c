//! One-time profile completion. Choosing an industry unlocks the main features.

pub mod handlers;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingRequest {
    pub industry: String,
    #[serde(default)]
    pub sub_industry: Option<String>,
    #[serde(default)]
    pub experience: Option<i32>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingStatus {
    pub is_onboarded: bool,
}

/// Builds the stored industry key, e.g. `tech-software-development`.
pub fn industry_key(industry: &str, sub_industry: Option<&str>) -> Result<String, AppError> {
    let industry = slug(industry);
    if industry.is_empty() {
        return Err(AppError::Validation("industry is required".to_string()));
    }

    Ok(match sub_industry.map(slug).filter(|sub| !sub.is_empty()) {
        Some(sub) => format!("{industry}-{sub}"),
        None => industry,
    })
}

fn slug(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Trims skills and drops blanks, keeping the submitted order.
pub fn clean_skills(skills: &[String]) -> Vec<String> {
    skills
        .iter()
        .map(|skill| skill.trim())
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}
