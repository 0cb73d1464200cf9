use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    db::{
        daily_assignment::{AssignmentMode, DailyAssignment, DailyAssignmentCore},
        question::Question,
    },
    mongodb::Id,
};

/// Request body for installing a curated assignment for today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAssignmentSpec {
    pub question_ids: Vec<Id>,
    pub created_by: Id,
}

/// An API-friendly daily assignment description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAssignmentDescription {
    pub day: DateTime<Utc>,
    pub question_ids: Vec<Id>,
    pub mode: AssignmentMode,
    pub created_by: Option<Id>,
    pub created_at: DateTime<Utc>,
}

impl From<DailyAssignmentCore> for DailyAssignmentDescription {
    fn from(assignment: DailyAssignmentCore) -> Self {
        Self {
            day: assignment.day,
            question_ids: assignment.question_ids,
            mode: assignment.mode,
            created_by: assignment.created_by,
            created_at: assignment.created_at,
        }
    }
}

impl From<DailyAssignment> for DailyAssignmentDescription {
    fn from(assignment: DailyAssignment) -> Self {
        assignment.assignment.into()
    }
}

/// A pool question as listed for assignment curation: enough to pick by,
/// nothing a participant-facing client should see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: Id,
    pub prompt: String,
    pub tags: String,
}

impl From<Question> for QuestionSummary {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            prompt: question.question.prompt,
            tags: question.question.tags,
        }
    }
}
