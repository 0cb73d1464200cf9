use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    access_code::{AccessCode, AccessCodeCore, CodeScope},
    attempt::{Attempt, AttemptCore},
    daily_assignment::{DailyAssignment, DailyAssignmentCore},
    question::Question,
    restriction::{RestrictionCore, RestrictionEntry},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Access code collections
const ACCESS_CODES: &str = "access_codes";
impl MongoCollection for AccessCode {
    const NAME: &'static str = ACCESS_CODES;
}
impl MongoCollection for AccessCodeCore {
    const NAME: &'static str = ACCESS_CODES;
}

// Daily assignment collections
const DAILY_ASSIGNMENTS: &str = "daily_assignments";
impl MongoCollection for DailyAssignment {
    const NAME: &'static str = DAILY_ASSIGNMENTS;
}
impl MongoCollection for DailyAssignmentCore {
    const NAME: &'static str = DAILY_ASSIGNMENTS;
}

// Question pool collection (read-only here; owned by the question-bank service)
const QUESTIONS: &str = "questions";
impl MongoCollection for Question {
    const NAME: &'static str = QUESTIONS;
}

// Restriction registry collections
const RESTRICTIONS: &str = "restrictions";
impl MongoCollection for RestrictionEntry {
    const NAME: &'static str = RESTRICTIONS;
}
impl MongoCollection for RestrictionCore {
    const NAME: &'static str = RESTRICTIONS;
}

// Submission attempt collections
const ATTEMPTS: &str = "attempts";
impl MongoCollection for Attempt {
    const NAME: &'static str = ATTEMPTS;
}
impl MongoCollection for AttemptCore {
    const NAME: &'static str = ATTEMPTS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent. Every atomic check-then-write in the model
/// is backed by one of these indexes.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Access code lookup by code value. Deliberately non-unique: the global
    // singleton is keyed by scope, not by value.
    let code_index = IndexModel::builder().keys(doc! {"code": 1}).build();
    Coll::<AccessCode>::from_db(db)
        .create_index(code_index, None)
        .await?;

    // The global code is a singleton. Unique only over the global scope, so
    // two rotations racing over an empty collection cannot both insert;
    // personal codes share the collection and are unconstrained.
    let scope_index = IndexModel::builder()
        .keys(doc! {"scope": 1})
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(doc! {"scope": CodeScope::Global})
                .build(),
        )
        .build();
    Coll::<AccessCode>::from_db(db)
        .create_index(scope_index, None)
        .await?;

    // At most one assignment per day.
    let day_index = IndexModel::builder()
        .keys(doc! {"day": 1})
        .options(unique.clone())
        .build();
    Coll::<DailyAssignment>::from_db(db)
        .create_index(day_index, None)
        .await?;

    // The restriction registry is a set.
    let identity_index = IndexModel::builder()
        .keys(doc! {"identity": 1})
        .options(unique.clone())
        .build();
    Coll::<RestrictionEntry>::from_db(db)
        .create_index(identity_index, None)
        .await?;

    // At most one scored attempt per subject per dedup bucket.
    let attempt_index = IndexModel::builder()
        .keys(doc! {"subject": 1, "dedup_bucket": 1})
        .options(unique)
        .build();
    Coll::<Attempt>::from_db(db)
        .create_index(attempt_index, None)
        .await?;

    Ok(())
}
