use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        grade::Grade,
        submission::{AnswerSpec, QuestionResult},
    },
    db::attempt::{Attempt, AttemptCore},
};

/// Request body for submitting a completed quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Opaque participant identity.
    pub subject: String,
    pub answers: Vec<AnswerSpec>,
}

/// The scored outcome of a submission. Replayed verbatim from the stored
/// attempt on a duplicate submission, so a client retry cannot observe a
/// different result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub grade: Grade,
    pub is_best_score: bool,
    pub results: Vec<QuestionResult>,
    pub submitted_at: DateTime<Utc>,
}

impl From<AttemptCore> for ScoreResult {
    fn from(attempt: AttemptCore) -> Self {
        Self {
            score: attempt.score,
            total: attempt.total,
            percentage: attempt.percentage,
            grade: attempt.grade,
            is_best_score: attempt.is_best_score,
            results: attempt.detailed_results,
            submitted_at: attempt.submitted_at,
        }
    }
}

impl From<Attempt> for ScoreResult {
    fn from(attempt: Attempt) -> Self {
        attempt.attempt.into()
    }
}

/// Whether a subject has already submitted an attempt today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptedToday {
    pub attempted: bool,
}
