use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{
    doc, serde_helpers::chrono_datetime_as_bson_datetime, to_bson, Bson,
};
use mongodb::options::ReplaceOptions;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::code::Code,
    mongodb::{is_duplicate_key, Coll, Id},
};

/// Who an access code admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeScope {
    /// The single shared code, valid for all requesters until rotated.
    Global,
    /// Issued to one subject, delivered out-of-band.
    Personal,
}

impl From<CodeScope> for Bson {
    fn from(scope: CodeScope) -> Self {
        to_bson(&scope).expect("Serialisation is infallible")
    }
}

/// Core access code data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCodeCore {
    pub code: Code,
    pub scope: CodeScope,
    /// Set iff `scope` is `Personal`.
    pub owner: Option<Id>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    /// Audit flag: a personal code is marked on its first content resolve.
    /// It does not invalidate the code within its window.
    pub consumed: bool,
}

/// An access code without an ID.
pub type NewAccessCode = AccessCodeCore;

/// An access code from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCode {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub code: AccessCodeCore,
}

impl Deref for AccessCode {
    type Target = AccessCodeCore;

    fn deref(&self) -> &Self::Target {
        &self.code
    }
}

impl DerefMut for AccessCode {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.code
    }
}

impl AccessCodeCore {
    /// A fresh global code valid for `ttl` from now.
    pub fn global(ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            code: Code::random(),
            scope: CodeScope::Global,
            owner: None,
            issued_at: now,
            expires_at: now + ttl,
            consumed: false,
        }
    }

    /// A fresh personal code for `owner`, valid for `ttl` from now.
    pub fn personal(owner: Id, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            code: Code::random(),
            scope: CodeScope::Personal,
            owner: Some(owner),
            issued_at: now,
            expires_at: now + ttl,
            consumed: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// The outcome of looking up a submitted code. A miss and a stale hit are
/// distinct so the client can prompt re-entry vs re-issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeStatus {
    Valid,
    Expired,
    NotFound,
}

/// Atomically replace the global code with a fresh one.
///
/// A single replace-upsert keyed on the scope: there is never an instant with
/// two valid global codes, and rotation invalidates the old code even if its
/// natural expiry had not elapsed. Personal codes are untouched.
///
/// The upsert alone is only atomic once a global row exists; two rotations
/// racing over an empty collection could both insert. The partial unique
/// index on the global scope turns the loser's insert into a duplicate key
/// error, at which point a plain replace of the now-existing row wins.
pub async fn rotate_global(codes: &Coll<NewAccessCode>, ttl: Duration) -> Result<NewAccessCode> {
    let fresh = AccessCodeCore::global(ttl);
    let filter = doc! { "scope": CodeScope::Global };
    let options = ReplaceOptions::builder().upsert(true).build();
    match codes.replace_one(filter.clone(), &fresh, options).await {
        Ok(_) => Ok(fresh),
        Err(err) if is_duplicate_key(&err) => {
            codes.replace_one(filter, &fresh, None).await?;
            Ok(fresh)
        }
        Err(err) => Err(err.into()),
    }
}

/// Issue an independent personal code. Never fails to generate; collisions
/// with existing code values are tolerated (lookup returns the newest match).
pub async fn issue_personal(
    codes: &Coll<NewAccessCode>,
    owner: Id,
    ttl: Duration,
) -> Result<NewAccessCode> {
    let fresh = AccessCodeCore::personal(owner, ttl);
    codes.insert_one(&fresh, None).await?;
    Ok(fresh)
}

/// The current global code, regardless of expiry.
pub async fn current_global(codes: &Coll<AccessCode>) -> Result<Option<AccessCode>> {
    let filter = doc! { "scope": CodeScope::Global };
    Ok(codes.find_one(filter, None).await?)
}

/// Look up a code. Misses are results, not errors.
pub async fn validate(codes: &Coll<AccessCode>, code: &Code) -> Result<CodeStatus> {
    let found = codes
        .find_one(doc! { "code": code.to_string() }, None)
        .await?;
    Ok(match found {
        None => CodeStatus::NotFound,
        Some(access) if access.is_expired(Utc::now()) => CodeStatus::Expired,
        Some(_) => CodeStatus::Valid,
    })
}

/// Record first use of a personal code. Global codes are shared and checked
/// repeatedly until rotation, so they are never marked.
pub async fn consume(codes: &Coll<AccessCode>, code: &Code) -> Result<()> {
    let filter = doc! { "code": code.to_string(), "scope": CodeScope::Personal };
    codes
        .update_one(filter, doc! { "$set": { "consumed": true } }, None)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_codes_have_no_owner() {
        let code = AccessCodeCore::global(Duration::hours(1));
        assert_eq!(code.scope, CodeScope::Global);
        assert!(code.owner.is_none());
        assert!(!code.consumed);
        assert_eq!(code.expires_at - code.issued_at, Duration::hours(1));
    }

    #[test]
    fn personal_codes_keep_their_owner() {
        let owner = Id::new();
        let code = AccessCodeCore::personal(owner, Duration::hours(24));
        assert_eq!(code.scope, CodeScope::Personal);
        assert_eq!(code.owner, Some(owner));
        assert_eq!(code.expires_at - code.issued_at, Duration::hours(24));
    }

    #[test]
    fn scope_serialises_to_the_singleton_key() {
        // The rotation filter and the partial unique index on the access
        // code collection both key on this exact value.
        assert_eq!(Bson::from(CodeScope::Global), Bson::String("Global".into()));
        assert_eq!(
            Bson::from(CodeScope::Personal),
            Bson::String("Personal".into())
        );
    }

    #[test]
    fn expiry_is_a_strict_cutoff() {
        let code = AccessCodeCore::global(Duration::hours(1));
        assert!(!code.is_expired(code.expires_at));
        assert!(code.is_expired(code.expires_at + Duration::seconds(1)));
    }
}
