use std::ops::Deref;

use mongodb::bson::doc;
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::mongodb::{is_duplicate_key, Coll, Id};

/// Core restriction registry data: an identity gated onto the fixed daily
/// content path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionCore {
    pub identity: String,
}

/// A restriction without an ID.
pub type NewRestriction = RestrictionCore;

/// A restriction entry from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictionEntry {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub restriction: RestrictionCore,
}

impl Deref for RestrictionEntry {
    type Target = RestrictionCore;

    fn deref(&self) -> &Self::Target {
        &self.restriction
    }
}

/// Add an identity to the registry. Adding one that is already present is an
/// idempotent no-op; returns whether anything was inserted.
pub async fn add(restrictions: &Coll<NewRestriction>, identity: &str) -> Result<bool> {
    let entry = RestrictionCore {
        identity: identity.to_string(),
    };
    match restrictions.insert_one(&entry, None).await {
        Ok(_) => Ok(true),
        Err(err) if is_duplicate_key(&err) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Remove an identity; returns false if it was not present.
pub async fn remove(restrictions: &Coll<RestrictionEntry>, identity: &str) -> Result<bool> {
    let result = restrictions
        .delete_one(doc! { "identity": identity }, None)
        .await?;
    Ok(result.deleted_count > 0)
}

/// All gated identities.
pub async fn list(restrictions: &Coll<RestrictionEntry>) -> Result<Vec<String>> {
    let entries: Vec<RestrictionEntry> =
        restrictions.find(None, None).await?.try_collect().await?;
    Ok(entries
        .into_iter()
        .map(|entry| entry.restriction.identity)
        .collect())
}

/// Is this identity gated onto the fixed daily content?
pub async fn is_restricted(restrictions: &Coll<RestrictionEntry>, identity: &str) -> Result<bool> {
    let found = restrictions
        .find_one(doc! { "identity": identity }, None)
        .await?;
    Ok(found.is_some())
}
