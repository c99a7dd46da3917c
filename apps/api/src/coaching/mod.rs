//! Read-only views over saved cover letters and interview quiz results.

pub mod handlers;

use serde::Serialize;

use crate::models::coaching::AssessmentRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentStats {
    pub total: usize,
    /// Mean quiz score rounded to one decimal; 0 with no assessments.
    pub average_score: f64,
    pub questions_answered: usize,
    pub latest_score: Option<f64>,
}

/// Summarizes assessments ordered oldest first.
pub fn assessment_stats(assessments: &[AssessmentRow]) -> AssessmentStats {
    let total = assessments.len();
    let average_score = if total == 0 {
        0.0
    } else {
        let sum: f64 = assessments.iter().map(|a| a.quiz_score).sum();
        (sum / total as f64 * 10.0).round() / 10.0
    };

    AssessmentStats {
        total,
        average_score,
        questions_answered: assessments
            .iter()
            .map(|a| a.questions.as_array().map_or(0, Vec::len))
            .sum(),
        latest_score: assessments.last().map(|a| a.quiz_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn assessment(score: f64, questions: usize) -> AssessmentRow {
        AssessmentRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            quiz_score: score,
            questions: json!(vec![json!({"question": "q"}); questions]),
            category: "Technical".to_string(),
            improvement_tip: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_stats_for_no_assessments() {
        let stats = assessment_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.latest_score, None);
    }

    #[test]
    fn test_stats_average_and_latest() {
        let stats = assessment_stats(&[assessment(70.0, 10), assessment(85.0, 10), assessment(90.5, 5)]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.average_score, 81.8);
        assert_eq!(stats.questions_answered, 25);
        assert_eq!(stats.latest_score, Some(90.5));
    }
}
