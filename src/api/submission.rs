use std::collections::HashMap;

use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::config::{Config, Notifier};
use crate::error::{Error, Result};
use crate::model::{
    api::submission::{AttemptedToday, ScoreResult, SubmitRequest},
    common::{
        grade::Grade,
        scoring::percentage,
        submission::{AnswerSpec, QuestionResult},
    },
    db::{
        attempt::{self, Attempt, AttemptCore, NewAttempt},
        question::{self, Question},
    },
    mongodb::{Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![submit, attempt_history, attempted_today]
}

/// Score a submission exactly once per dedup window.
///
/// The unique `(subject, dedup_bucket)` index makes the insert itself the
/// dedup guard: whichever concurrent submission wins the insert owns the
/// bucket, and every loser replays the winner's stored result.
#[post("/quiz/submit", data = "<request>")]
async fn submit(
    request: Json<SubmitRequest>,
    attempts: Coll<Attempt>,
    new_attempts: Coll<NewAttempt>,
    questions: Coll<Question>,
    config: &State<Config>,
    notifier: &State<Notifier>,
) -> Result<Json<ScoreResult>> {
    let request = request.0;
    if request.subject.is_empty() {
        return Err(Error::bad_request("subject must not be empty"));
    }
    if request.answers.is_empty() {
        return Err(Error::bad_request("answers must not be empty"));
    }

    let window = config.dedup_window();

    // Fast path: a submission inside the window replays the stored result
    // without re-scoring.
    if let Some(stored) = attempt::recent(&attempts, &request.subject, window).await? {
        debug!("Replaying stored attempt for '{}'", request.subject);
        return Ok(Json(stored.into()));
    }

    let ids: Vec<Id> = request.answers.iter().map(|answer| answer.question_id).collect();
    let pool = question::find_by_ids(&questions, &ids).await?;
    let (score, detailed_results) = score_answers(&request.answers, pool);

    let total = request.answers.len() as u32;
    let percentage = percentage(score, total);
    let now = Utc::now();
    let record = AttemptCore {
        subject: request.subject.clone(),
        submitted_at: now,
        dedup_bucket: attempt::bucket(now, window),
        answers: request.answers,
        score,
        total,
        percentage,
        grade: Grade::from_percentage(percentage),
        detailed_results,
        is_best_score: attempt::is_new_best(
            attempt::best_score(&attempts, &request.subject).await?,
            score,
        ),
    };

    if !attempt::record(&new_attempts, &record).await? {
        // Lost the insert race; the winner's stored result replays.
        let stored = attempt::in_bucket(&attempts, &request.subject, record.dedup_bucket)
            .await?
            .map(|attempt| attempt.attempt);
        let (winner, _) = attempt::resolve_duplicate(stored, record);
        return Ok(Json(winner.into()));
    }

    notifier
        .notify(
            "Quiz submission scored",
            &format!(
                "{} scored {}/{} ({}%, {})",
                record.subject, record.score, record.total, record.percentage, record.grade
            ),
        )
        .await;

    Ok(Json(record.into()))
}

/// Whether the subject has already submitted today (UTC), for clients that
/// gate one formal attempt per day.
#[get("/quiz/attempted-today/<subject>")]
async fn attempted_today(
    subject: String,
    attempts: Coll<Attempt>,
) -> Result<Json<AttemptedToday>> {
    let attempted = attempt::attempted_today(&attempts, &subject).await?;
    Ok(Json(AttemptedToday { attempted }))
}

/// A subject's attempt history, newest first.
#[get("/quiz/attempts/<subject>")]
async fn attempt_history(
    subject: String,
    attempts: Coll<Attempt>,
) -> Result<Json<Vec<ScoreResult>>> {
    let history = attempt::history(&attempts, &subject).await?;
    Ok(Json(history.into_iter().map(Into::into).collect()))
}

/// Score each answer against the fetched questions. Answers referencing
/// unknown questions score as incorrect rather than failing the submission.
fn score_answers(answers: &[AnswerSpec], pool: Vec<Question>) -> (u32, Vec<QuestionResult>) {
    let by_id: HashMap<Id, Question> = pool
        .into_iter()
        .map(|question| (question.id, question))
        .collect();
    let results: Vec<QuestionResult> = answers
        .iter()
        .map(|answer| match by_id.get(&answer.question_id) {
            Some(question) => question.assess(&answer.selected_values),
            None => QuestionResult::missing(answer.question_id),
        })
        .collect();
    let score = results.iter().filter(|result| result.correct).count() as u32;
    (score, results)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::common::question::QuestionCore;

    fn answer(question_id: Id, values: &[&str]) -> AnswerSpec {
        AnswerSpec {
            question_id,
            selected_values: values.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn scores_mixed_submissions() {
        let single = Question {
            id: Id::new(),
            question: QuestionCore::example_single(),
        };
        let multi = Question {
            id: Id::new(),
            question: QuestionCore::example_multi(),
        };
        let answers = vec![
            answer(single.id, &["B"]),
            answer(multi.id, &["Y", "X"]),
            answer(multi.id, &["Z"]),
        ];
        let pool = vec![single, multi];

        let (score, results) = score_answers(&answers, pool);
        assert_eq!(score, 2);
        assert_eq!(results.len(), 3);
        assert!(results[0].correct && results[1].correct && !results[2].correct);
    }

    #[test]
    fn unknown_questions_score_as_incorrect() {
        let known = Question {
            id: Id::new(),
            question: QuestionCore::example_single(),
        };
        let unknown_id = Id::new();
        let answers = vec![answer(known.id, &["B"]), answer(unknown_id, &["A"])];

        let (score, results) = score_answers(&answers, vec![known]);
        assert_eq!(score, 1);
        assert!(!results[1].found);
        assert!(!results[1].correct);
        assert_eq!(results[1].question_id, unknown_id);
    }

    #[test]
    fn empty_pool_scores_zero() {
        let answers = vec![answer(Id::new(), &["A"])];
        let (score, results) = score_answers(&answers, Vec::new());
        assert_eq!(score, 0);
        assert!(results.iter().all(|result| !result.found));
    }
}
