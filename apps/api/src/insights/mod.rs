//! Industry insights dashboard.
//!
//! Turns the stored insight row for the user's industry into display-ready
//! values. Missing data degrades to "N/A" or empty lists, never an error.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::Serialize;
use timeago::Formatter;

use crate::models::insights::IndustryInsightRow;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Colour {
    Green,
    Yellow,
    Red,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Flat,
    Down,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelView {
    pub label: String,
    pub colour: Colour,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlookView {
    pub label: String,
    pub trend: Trend,
    pub colour: Colour,
}

/// Salary figures in thousands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryBar {
    pub role: String,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub industry: String,
    pub market_outlook: OutlookView,
    pub growth_rate: String,
    /// Growth rate clamped to 0–100 for progress bars.
    pub growth_progress: f64,
    pub demand_level: LevelView,
    pub top_skills: Vec<String>,
    pub salary_ranges: Vec<SalaryBar>,
    pub key_trends: Vec<String>,
    pub recommended_skills: Vec<String>,
    pub last_updated: String,
    pub next_update: String,
}

pub fn build_dashboard(row: &IndustryInsightRow, now: DateTime<Utc>) -> DashboardView {
    DashboardView {
        industry: row.industry.clone(),
        market_outlook: outlook(row.market_outlook.as_deref()),
        growth_rate: row
            .growth_rate
            .map(|rate| format!("{rate:.1}%"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        growth_progress: row.growth_rate.unwrap_or(0.0).clamp(0.0, 100.0),
        demand_level: demand_level(row.demand_level.as_deref()),
        top_skills: row.top_skills.clone(),
        salary_ranges: row
            .salary_ranges
            .iter()
            .map(|range| SalaryBar {
                role: range.role.clone(),
                min: range.min / 1000.0,
                median: range.median / 1000.0,
                max: range.max / 1000.0,
            })
            .collect(),
        key_trends: row.key_trends.clone(),
        recommended_skills: row.recommended_skills.clone(),
        last_updated: row
            .last_updated
            .map(|date| date.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        next_update: row
            .next_update
            .map(|date| relative_to(date, now))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

fn demand_level(level: Option<&str>) -> LevelView {
    let colour = match level.map(str::to_lowercase).as_deref() {
        Some("high") => Colour::Green,
        Some("medium") => Colour::Yellow,
        Some("low") => Colour::Red,
        _ => Colour::Gray,
    };
    LevelView {
        label: level.unwrap_or(NOT_AVAILABLE).to_string(),
        colour,
    }
}

fn outlook(outlook: Option<&str>) -> OutlookView {
    let (trend, colour) = match outlook.map(str::to_lowercase).as_deref() {
        Some("positive") => (Trend::Up, Colour::Green),
        Some("neutral") => (Trend::Flat, Colour::Yellow),
        Some("negative") => (Trend::Down, Colour::Red),
        _ => (Trend::Flat, Colour::Gray),
    };
    OutlookView {
        label: outlook.unwrap_or(NOT_AVAILABLE).to_string(),
        trend,
        colour,
    }
}

/// "in 3 days" for future instants, "3 days ago" for past ones.
fn relative_to(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = instant.signed_duration_since(now);
    match delta.to_std() {
        Ok(ahead) => {
            let mut formatter = Formatter::new();
            formatter.ago("");
            format!("in {}", formatter.convert(ahead).trim())
        }
        Err(_) => Formatter::new().convert((-delta).to_std().unwrap_or_default()),
    }
}
