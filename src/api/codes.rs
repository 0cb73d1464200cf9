use rocket::{serde::json::Json, Route, State};

use crate::config::{Config, Notifier};
use crate::error::{Error, Result};
use crate::model::{
    api::code::{CodeDescription, PersonalCodeRequest, ValidateRequest, ValidateResponse},
    common::code::Code,
    db::access_code::{
        self, AccessCode, CodeStatus, NewAccessCode,
    },
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![rotate, current, personal, validate]
}

/// Rotate the global code on demand. The old code is invalid the instant
/// this returns, whatever its natural expiry was.
#[post("/codes/rotate")]
async fn rotate(
    codes: Coll<NewAccessCode>,
    config: &State<Config>,
) -> Result<Json<CodeDescription>> {
    let fresh = access_code::rotate_global(&codes, config.code_ttl()).await?;
    info!("Rotated global access code, valid until {}", fresh.expires_at);
    Ok(Json(fresh.into()))
}

#[get("/codes/current")]
async fn current(codes: Coll<AccessCode>) -> Result<Json<CodeDescription>> {
    let code = access_code::current_global(&codes)
        .await?
        .ok_or_else(|| Error::not_found("No global code has been issued yet"))?;
    Ok(Json(code.into()))
}

/// Issue a personal code and deliver it out-of-band. The response confirms
/// issuance; the code itself reaches the owner via the notifier.
#[post("/codes/personal", data = "<request>")]
async fn personal(
    request: Json<PersonalCodeRequest>,
    codes: Coll<NewAccessCode>,
    config: &State<Config>,
    notifier: &State<Notifier>,
) -> Result<Json<CodeDescription>> {
    let owner = request.0.owner;
    let fresh = access_code::issue_personal(&codes, owner, config.personal_code_ttl()).await?;
    notifier
        .notify(
            "Your quiz access code",
            &format!(
                "Your personal access code is {}. It is valid until {}.",
                fresh.code, fresh.expires_at
            ),
        )
        .await;
    info!("Issued personal access code for {owner}");
    Ok(Json(fresh.into()))
}

/// Look up a submitted code. Always 200: a miss, a stale hit, and a valid
/// hit are all ordinary outcomes the client switches on. A malformed code
/// cannot possibly be in the store, so it reports `not-found` too.
#[post("/codes/validate", data = "<request>")]
async fn validate(
    request: Json<ValidateRequest>,
    codes: Coll<AccessCode>,
) -> Result<Json<ValidateResponse>> {
    let status = match request.0.code.parse::<Code>() {
        Ok(code) => access_code::validate(&codes, &code).await?,
        Err(_) => CodeStatus::NotFound,
    };
    Ok(Json(ValidateResponse { status }))
}
