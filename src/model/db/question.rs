use std::ops::Deref;

use mongodb::bson::{doc, from_document};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::{
        question::QuestionCore,
        scoring::selection_is_correct,
        submission::{OptionResult, QuestionResult},
    },
    mongodb::{Coll, Id},
};

/// A question from the pool, with its unique ID. The pool is owned by the
/// question-bank service; this side only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub question: QuestionCore,
}

impl Deref for Question {
    type Target = QuestionCore;

    fn deref(&self) -> &Self::Target {
        &self.question
    }
}

impl Question {
    /// Score a selection against this question's answer key and produce the
    /// full breakdown for the subject's records.
    pub fn assess(&self, selected: &[String]) -> QuestionResult {
        let correct_values = self.correct_values();
        let correct = selection_is_correct(&correct_values, selected);
        let options = self
            .options
            .iter()
            .map(|option| OptionResult {
                value: option.value.clone(),
                is_correct: option.is_correct,
                is_selected: selected.contains(&option.value),
            })
            .collect();
        QuestionResult {
            question_id: self.id,
            prompt: Some(self.prompt.clone()),
            found: true,
            correct,
            options,
            explanation: self.explanation.clone(),
        }
    }
}

/// The entire question pool, for assignment curation.
pub async fn list_all(questions: &Coll<Question>) -> Result<Vec<Question>> {
    Ok(questions.find(None, None).await?.try_collect().await?)
}

/// Fetch the questions with the given IDs. Unknown IDs are simply absent
/// from the result.
pub async fn find_by_ids(questions: &Coll<Question>, ids: &[Id]) -> Result<Vec<Question>> {
    let filter = doc! { "_id": { "$in": ids.to_vec() } };
    Ok(questions.find(filter, None).await?.try_collect().await?)
}

/// Draw `size` questions uniformly at random without replacement. If the
/// pool is smaller than `size`, returns the whole pool.
pub async fn sample(questions: &Coll<Question>, size: u32) -> Result<Vec<Question>> {
    let pipeline = vec![doc! { "$sample": { "size": i64::from(size) } }];
    let mut cursor = questions.aggregate(pipeline, None).await?;
    let mut sampled = Vec::new();
    while let Some(document) = cursor.try_next().await? {
        sampled.push(from_document(document)?);
    }
    Ok(sampled)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::common::question::QuestionCore;

    fn question(core: QuestionCore) -> Question {
        Question {
            id: Id::new(),
            question: core,
        }
    }

    fn selection(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn single_answer_assessment() {
        let q = question(QuestionCore::example_single());
        assert!(q.assess(&selection(&["B"])).correct);
        assert!(!q.assess(&selection(&["A"])).correct);
    }

    #[test]
    fn multi_answer_assessment_ignores_order() {
        let q = question(QuestionCore::example_multi());
        assert!(q.assess(&selection(&["Y", "X"])).correct);
        assert!(!q.assess(&selection(&["X"])).correct);
    }

    #[test]
    fn assessment_records_the_key_and_the_selection() {
        let q = question(QuestionCore::example_single());
        let result = q.assess(&selection(&["A"]));
        assert!(result.found);
        assert_eq!(result.prompt.as_deref(), Some(q.prompt.as_str()));
        assert_eq!(result.options.len(), 4);

        let a = result.options.iter().find(|o| o.value == "A").unwrap();
        assert!(a.is_selected && !a.is_correct);
        let b = result.options.iter().find(|o| o.value == "B").unwrap();
        assert!(!b.is_selected && b.is_correct);
    }
}
