use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::model::{db::question::Question, mongodb::Id};

/// One answer option as served to a client: just the value. The correctness
/// flag stays server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionView {
    pub value: String,
}

/// A question prepared for delivery: options shuffled, answer key stripped,
/// with only the count of correct options exposed so the client can render
/// single- vs multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: Id,
    pub prompt: String,
    pub options: Vec<OptionView>,
    pub total_correct: usize,
    pub tags: String,
}

impl QuestionView {
    /// Prepare a question for delivery. Fisher-Yates over the option order,
    /// independently per request, so option position carries no signal.
    pub fn prepare(question: Question, rng: &mut impl Rng) -> Self {
        let total_correct = question.total_correct();
        let mut options: Vec<OptionView> = question
            .options
            .iter()
            .map(|option| OptionView {
                value: option.value.clone(),
            })
            .collect();
        options.shuffle(rng);
        Self {
            id: question.id,
            prompt: question.question.prompt,
            options,
            total_correct,
            tags: question.question.tags,
        }
    }
}

/// The content served for a quiz request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResponse {
    pub questions: Vec<QuestionView>,
    /// True when the questions came from today's fixed assignment rather
    /// than a per-request random draw.
    pub is_admin_set: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};
    use rocket::serde::json::serde_json;

    use crate::model::common::question::QuestionCore;

    fn question(core: QuestionCore) -> Question {
        Question {
            id: Id::new(),
            question: core,
        }
    }

    #[test]
    fn views_never_reveal_the_key() {
        let mut rng = StdRng::seed_from_u64(7);
        let view = QuestionView::prepare(question(QuestionCore::example_single()), &mut rng);
        let serialized = serde_json::to_string(&view).unwrap();
        assert!(!serialized.contains("is_correct"));
        assert_eq!(view.total_correct, 1);
    }

    #[test]
    fn shuffling_preserves_the_option_set() {
        let mut rng = StdRng::seed_from_u64(7);
        let original = question(QuestionCore::example_single());
        let values: HashSet<String> = original
            .options
            .iter()
            .map(|option| option.value.clone())
            .collect();
        let view = QuestionView::prepare(original, &mut rng);
        let shuffled: HashSet<String> =
            view.options.into_iter().map(|option| option.value).collect();
        assert_eq!(shuffled, values);
    }

    #[test]
    fn multi_answer_views_count_the_key() {
        let mut rng = StdRng::seed_from_u64(7);
        let view = QuestionView::prepare(question(QuestionCore::example_multi()), &mut rng);
        assert_eq!(view.total_correct, 2);
    }
}
