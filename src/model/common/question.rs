use serde::{Deserialize, Serialize};

/// One possible answer to a question. The `is_correct` flag never leaves the
/// server; client views strip it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub value: String,
    pub is_correct: bool,
}

/// Core question data, as supplied by the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCore {
    /// Question text.
    pub prompt: String,
    /// Possible answers, one or more flagged correct.
    pub options: Vec<AnswerOption>,
    /// Free-form topic tags.
    #[serde(default)]
    pub tags: String,
    /// Optional explanation shown in the post-submission breakdown.
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionCore {
    /// The values flagged correct, i.e. the answer key.
    pub fn correct_values(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|option| option.is_correct)
            .map(|option| option.value.clone())
            .collect()
    }

    /// How many options are correct. This count is safe to serve to clients:
    /// it drives single- vs multi-select UI without revealing which options
    /// make it up.
    pub fn total_correct(&self) -> usize {
        self.options.iter().filter(|option| option.is_correct).count()
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl QuestionCore {
        /// A single-answer question with key `B`.
        pub fn example_single() -> Self {
            Self {
                prompt: "Which layer fragments datagrams?".to_string(),
                options: vec![
                    AnswerOption {
                        value: "A".to_string(),
                        is_correct: false,
                    },
                    AnswerOption {
                        value: "B".to_string(),
                        is_correct: true,
                    },
                    AnswerOption {
                        value: "C".to_string(),
                        is_correct: false,
                    },
                    AnswerOption {
                        value: "D".to_string(),
                        is_correct: false,
                    },
                ],
                tags: "networking".to_string(),
                explanation: Some("Fragmentation happens at the IP layer.".to_string()),
            }
        }

        /// A multi-answer question with key `{X, Y}`.
        pub fn example_multi() -> Self {
            Self {
                prompt: "Select all connection-oriented protocols.".to_string(),
                options: vec![
                    AnswerOption {
                        value: "X".to_string(),
                        is_correct: true,
                    },
                    AnswerOption {
                        value: "Y".to_string(),
                        is_correct: true,
                    },
                    AnswerOption {
                        value: "Z".to_string(),
                        is_correct: false,
                    },
                ],
                tags: String::new(),
                explanation: None,
            }
        }
    }
}
