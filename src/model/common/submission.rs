use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// One answered question within a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSpec {
    pub question_id: Id,
    pub selected_values: Vec<String>,
}

/// One option within a per-question breakdown: the full key plus what the
/// subject picked. Only ever serialized after scoring, so revealing
/// `is_correct` here is intended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionResult {
    pub value: String,
    pub is_correct: bool,
    pub is_selected: bool,
}

/// The scored outcome of a single answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: Id,
    /// Question text; absent if the question was not found.
    pub prompt: Option<String>,
    /// False if the referenced question does not exist in the pool.
    pub found: bool,
    pub correct: bool,
    pub options: Vec<OptionResult>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionResult {
    /// The result recorded for an answer referencing an unknown question:
    /// counted as incorrect, never failing the whole submission.
    pub fn missing(question_id: Id) -> Self {
        Self {
            question_id,
            prompt: None,
            found: false,
            correct: false,
            options: Vec::new(),
            explanation: None,
        }
    }
}
