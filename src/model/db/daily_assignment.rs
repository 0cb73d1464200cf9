use std::ops::{Deref, DerefMut};

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use mongodb::bson::{
    doc, serde_helpers::chrono_datetime_as_bson_datetime, to_bson, Bson,
};
use mongodb::options::ReplaceOptions;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    db::question::{sample, Question},
    mongodb::{is_duplicate_key, Coll, Id},
};

/// How today's assignment came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentMode {
    /// Drawn uniformly at random by the daily timer.
    Auto,
    /// Curated by an administrator; always supersedes Auto.
    Manual,
}

impl From<AssignmentMode> for Bson {
    fn from(mode: AssignmentMode) -> Self {
        to_bson(&mode).expect("Serialisation is infallible")
    }
}

/// Core daily assignment data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAssignmentCore {
    /// Midnight-truncated UTC day this assignment is canonical for.
    /// A unique index guarantees at most one assignment per day.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub day: DateTime<Utc>,
    pub question_ids: Vec<Id>,
    pub mode: AssignmentMode,
    /// The curating admin, for Manual assignments.
    pub created_by: Option<Id>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A daily assignment without an ID.
pub type NewDailyAssignment = DailyAssignmentCore;

/// A daily assignment from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAssignment {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub assignment: DailyAssignmentCore,
}

impl Deref for DailyAssignment {
    type Target = DailyAssignmentCore;

    fn deref(&self) -> &Self::Target {
        &self.assignment
    }
}

impl DerefMut for DailyAssignment {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.assignment
    }
}

/// Truncate a timestamp to the UTC midnight that starts its calendar day.
pub fn day_key(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// Today's assignment, if any.
pub async fn today(assignments: &Coll<DailyAssignment>) -> Result<Option<DailyAssignment>> {
    let filter = doc! { "day": day_key(Utc::now()) };
    Ok(assignments.find_one(filter, None).await?)
}

/// Make sure today has an assignment, drawing a random one if not.
///
/// Idempotent under concurrent ticks: the insert races against the unique
/// index on `day`, and losing the race is a no-op, not an error. Returns the
/// created assignment, or `None` if one already existed.
pub async fn ensure_auto(
    assignments: &Coll<NewDailyAssignment>,
    questions: &Coll<Question>,
    pool_size: u32,
) -> Result<Option<DailyAssignmentCore>> {
    let day = day_key(Utc::now());

    // Fast path: skip the sampling work if today is already covered.
    let existing = assignments.find_one(doc! { "day": day }, None).await?;
    if existing.is_some() {
        return Ok(None);
    }

    let sampled = sample(questions, pool_size).await?;
    let assignment = DailyAssignmentCore {
        day,
        question_ids: sampled.iter().map(|question| question.id).collect(),
        mode: AssignmentMode::Auto,
        created_by: None,
        created_at: Utc::now(),
    };

    match assignments.insert_one(&assignment, None).await {
        Ok(_) => Ok(Some(assignment)),
        // Another tick beat us to it.
        Err(err) if is_duplicate_key(&err) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Install a curated assignment for today, superseding whatever exists.
/// A single replace-upsert keyed on the day, so Manual-over-Auto needs no
/// separate delete step and cannot race into two assignments.
pub async fn set_manual(
    assignments: &Coll<NewDailyAssignment>,
    question_ids: Vec<Id>,
    created_by: Id,
) -> Result<DailyAssignmentCore> {
    if question_ids.is_empty() {
        return Err(Error::bad_request("question_ids must not be empty"));
    }

    let day = day_key(Utc::now());
    let assignment = DailyAssignmentCore {
        day,
        question_ids,
        mode: AssignmentMode::Manual,
        created_by: Some(created_by),
        created_at: Utc::now(),
    };
    let options = ReplaceOptions::builder().upsert(true).build();
    assignments
        .replace_one(doc! { "day": day }, &assignment, options)
        .await?;
    Ok(assignment)
}

/// Delete today's assignment entirely, whatever its mode. Content requests
/// fall back to per-request randomization until a new one is created.
/// Returns false if there was nothing to delete.
pub async fn reset(assignments: &Coll<DailyAssignment>) -> Result<bool> {
    let result = assignments
        .delete_many(doc! { "day": day_key(Utc::now()) }, None)
        .await?;
    Ok(result.deleted_count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    #[test]
    fn day_key_truncates_to_midnight() {
        let afternoon = Utc.with_ymd_and_hms(2024, 3, 15, 14, 52, 9).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(day_key(afternoon), midnight);
        // Already-truncated keys are fixed points.
        assert_eq!(day_key(midnight), midnight);
    }

    #[test]
    fn day_key_is_stable_within_a_day() {
        let morning = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 1).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap();
        assert_eq!(day_key(morning), day_key(night));
        assert_eq!(
            day_key(night + Duration::seconds(1)),
            day_key(night) + Duration::days(1)
        );
    }
}
