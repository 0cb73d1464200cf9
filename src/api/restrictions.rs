use rocket::{serde::json::Json, Route};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    db::restriction::{self, NewRestriction, RestrictionEntry},
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![add_restriction, remove_restriction, list_restrictions]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionRequest {
    pub identity: String,
}

/// Gate an identity onto the fixed daily content. Adding an identity that
/// is already gated is a no-op, not an error.
#[post("/restrictions", data = "<request>")]
async fn add_restriction(
    request: Json<RestrictionRequest>,
    restrictions: Coll<NewRestriction>,
) -> Result<()> {
    let identity = request.0.identity;
    if identity.is_empty() {
        return Err(Error::bad_request("identity must not be empty"));
    }
    if restriction::add(&restrictions, &identity).await? {
        info!("Restricted identity '{identity}'");
    }
    Ok(())
}

#[delete("/restrictions/<identity>")]
async fn remove_restriction(
    identity: String,
    restrictions: Coll<RestrictionEntry>,
) -> Result<()> {
    if !restriction::remove(&restrictions, &identity).await? {
        return Err(Error::not_found(format!("Restriction on '{identity}'")));
    }
    info!("Unrestricted identity '{identity}'");
    Ok(())
}

#[get("/restrictions")]
async fn list_restrictions(restrictions: Coll<RestrictionEntry>) -> Result<Json<Vec<String>>> {
    Ok(Json(restriction::list(&restrictions).await?))
}
