use std::ops::Deref;

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime};
use mongodb::options::{FindOneOptions, FindOptions};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::{
        grade::Grade,
        submission::{AnswerSpec, QuestionResult},
    },
    db::daily_assignment::day_key,
    mongodb::{is_duplicate_key, Coll, Id},
};

/// Core submission attempt data. Attempts are append-only: once written they
/// are never modified, so a subject's history is a faithful audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptCore {
    pub subject: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub submitted_at: DateTime<Utc>,
    /// Coarse time bucket; the unique `(subject, dedup_bucket)` index makes
    /// the insert itself the dedup guard.
    pub dedup_bucket: i64,
    /// The raw answers as submitted, kept alongside the scored breakdown.
    pub answers: Vec<AnswerSpec>,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub grade: Grade,
    pub detailed_results: Vec<QuestionResult>,
    pub is_best_score: bool,
}

/// An attempt without an ID.
pub type NewAttempt = AttemptCore;

/// An attempt from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub attempt: AttemptCore,
}

impl Deref for Attempt {
    type Target = AttemptCore;

    fn deref(&self) -> &Self::Target {
        &self.attempt
    }
}

/// The dedup bucket a timestamp falls into for the given window.
///
/// `div_euclid` keeps buckets well ordered across the epoch, and a
/// zero-or-negative window degenerates to one-second buckets rather than
/// dividing by zero.
pub fn bucket(at: DateTime<Utc>, window: Duration) -> i64 {
    at.timestamp().div_euclid(window.num_seconds().max(1))
}

/// Does `score` beat the prior personal best? Strictly greater: equalling
/// the best does not re-flag, and any first attempt is a best.
pub fn is_new_best(prior_best: Option<u32>, score: u32) -> bool {
    prior_best.map_or(true, |best| score > best)
}

/// Resolve a duplicate submission: whichever attempt is already stored (a
/// window hit, or the winner of the insert race) replays verbatim and the
/// freshly scored one is discarded. Returns the attempt to respond with and
/// whether the fresh one stood.
pub fn resolve_duplicate(
    stored: Option<AttemptCore>,
    fresh: AttemptCore,
) -> (AttemptCore, bool) {
    match stored {
        Some(stored) => (stored, false),
        None => (fresh, true),
    }
}

/// Two timestamps fall on the same UTC calendar day.
pub fn same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    day_key(a) == day_key(b)
}

/// The subject's most recent attempt inside the dedup window, if any. Used
/// as a fast path so duplicate submissions replay the stored result without
/// re-scoring.
pub async fn recent(
    attempts: &Coll<Attempt>,
    subject: &str,
    window: Duration,
) -> Result<Option<Attempt>> {
    let cutoff = Utc::now() - window;
    let filter = doc! { "subject": subject, "submitted_at": { "$gt": cutoff } };
    let options = FindOneOptions::builder()
        .sort(doc! { "submitted_at": -1 })
        .build();
    Ok(attempts.find_one(filter, options).await?)
}

/// The attempt sharing this exact dedup bucket, if any. Read after losing
/// the insert race to return what the winner stored.
pub async fn in_bucket(
    attempts: &Coll<Attempt>,
    subject: &str,
    dedup_bucket: i64,
) -> Result<Option<Attempt>> {
    let filter = doc! { "subject": subject, "dedup_bucket": dedup_bucket };
    Ok(attempts.find_one(filter, None).await?)
}

/// The subject's best score so far, if they have any attempts.
pub async fn best_score(attempts: &Coll<Attempt>, subject: &str) -> Result<Option<u32>> {
    let options = FindOneOptions::builder().sort(doc! { "score": -1 }).build();
    let best = attempts.find_one(doc! { "subject": subject }, options).await?;
    Ok(best.map(|attempt| attempt.score))
}

/// Persist an attempt. Returns false if another submission already owns this
/// subject's dedup bucket; the caller then re-reads the stored attempt.
pub async fn record(attempts: &Coll<NewAttempt>, attempt: &AttemptCore) -> Result<bool> {
    match attempts.insert_one(attempt, None).await {
        Ok(_) => Ok(true),
        Err(err) if is_duplicate_key(&err) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Has the subject already submitted an attempt today? Lets clients gate a
/// formal once-a-day attempt without fetching the whole history.
pub async fn attempted_today(attempts: &Coll<Attempt>, subject: &str) -> Result<bool> {
    let options = FindOneOptions::builder()
        .sort(doc! { "submitted_at": -1 })
        .build();
    let latest = attempts.find_one(doc! { "subject": subject }, options).await?;
    Ok(latest.map_or(false, |attempt| same_day(attempt.submitted_at, Utc::now())))
}

/// A subject's full attempt history, newest first.
pub async fn history(attempts: &Coll<Attempt>, subject: &str) -> Result<Vec<Attempt>> {
    let options = FindOptions::builder()
        .sort(doc! { "submitted_at": -1 })
        .build();
    Ok(attempts
        .find(doc! { "subject": subject }, options)
        .await?
        .try_collect()
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn attempt(subject: &str, score: u32, dedup_bucket: i64) -> AttemptCore {
        let percentage = score * 20;
        AttemptCore {
            subject: subject.to_string(),
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
            dedup_bucket,
            answers: Vec::new(),
            score,
            total: 5,
            percentage,
            grade: Grade::from_percentage(percentage),
            detailed_results: Vec::new(),
            is_best_score: false,
        }
    }

    #[test]
    fn buckets_are_window_sized() {
        let window = Duration::seconds(30);
        let start = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(bucket(start, window), bucket(start + Duration::seconds(29), window));
        assert_ne!(bucket(start, window), bucket(start + Duration::seconds(30), window));
    }

    #[test]
    fn degenerate_windows_fall_back_to_one_second() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(bucket(at, Duration::zero()), at.timestamp());
        assert_eq!(bucket(at, Duration::seconds(-5)), at.timestamp());
    }

    #[test]
    fn duplicate_submissions_replay_the_stored_attempt() {
        // The retry scored differently (a different random draw, a changed
        // best flag), but the stored attempt replays untouched.
        let stored = attempt("alice", 3, 100);
        let retry = attempt("alice", 5, 100);

        let (result, recorded) = resolve_duplicate(Some(stored.clone()), retry);
        assert!(!recorded);
        assert_eq!(result, stored);
        assert_eq!(result.score, 3);
        assert_eq!(result.grade, Grade::Fair);
    }

    #[test]
    fn uncontested_submissions_stand_as_recorded() {
        let fresh = attempt("alice", 5, 100);
        let (result, recorded) = resolve_duplicate(None, fresh.clone());
        assert!(recorded);
        assert_eq!(result, fresh);
    }

    #[test]
    fn same_day_is_bounded_by_utc_midnight() {
        let morning = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap();
        assert!(same_day(morning, night));
        assert!(!same_day(night, next));
    }

    #[test]
    fn best_score_flag_is_strictly_greater() {
        // The sequence 3, 5, 4 flags the first two only.
        assert!(is_new_best(None, 3));
        assert!(is_new_best(Some(3), 5));
        assert!(!is_new_best(Some(5), 4));
        // Ties do not re-flag.
        assert!(!is_new_best(Some(5), 5));
    }
}
