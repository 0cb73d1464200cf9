use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::code::Code,
    db::access_code::{AccessCode, AccessCodeCore, CodeScope, CodeStatus},
    mongodb::Id,
};

/// An API-friendly access code description. The owner is deliberately
/// absent: codes are delivered out-of-band and the response only confirms
/// what was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDescription {
    pub code: Code,
    pub scope: CodeScope,
    pub expires_at: DateTime<Utc>,
}

impl From<AccessCodeCore> for CodeDescription {
    fn from(code: AccessCodeCore) -> Self {
        Self {
            code: code.code,
            scope: code.scope,
            expires_at: code.expires_at,
        }
    }
}

impl From<AccessCode> for CodeDescription {
    fn from(code: AccessCode) -> Self {
        code.code.into()
    }
}

/// Request body for issuing a personal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalCodeRequest {
    pub owner: Id,
}

/// Request body for validating a code. Kept as a plain string so malformed
/// entries map to a `not-found` status instead of a parse rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
}

/// Response for a validation lookup; always 200, the status carries the
/// outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub status: CodeStatus,
}
