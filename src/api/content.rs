use rocket::{serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::content::{ContentResponse, QuestionView},
    common::code::Code,
    db::{
        access_code::{self, AccessCode, CodeStatus},
        daily_assignment::{self, DailyAssignment},
        question::{self, Question},
        restriction::{self, RestrictionEntry},
    },
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![quiz_content]
}

/// Resolve the questions a participant sees: check the code, decide between
/// the fixed daily path and a fresh random draw, and prepare the client
/// view.
#[get("/quiz/<code>?<identity>")]
async fn quiz_content(
    code: Code,
    identity: Option<String>,
    codes: Coll<AccessCode>,
    restrictions: Coll<RestrictionEntry>,
    assignments: Coll<DailyAssignment>,
    questions: Coll<Question>,
    config: &State<Config>,
) -> Result<Json<ContentResponse>> {
    match access_code::validate(&codes, &code).await? {
        CodeStatus::Valid => {}
        CodeStatus::Expired => {
            return Err(Error::Expired(format!("Access code '{code}'")));
        }
        CodeStatus::NotFound => {
            return Err(Error::not_found(format!("Access code '{code}'")));
        }
    }
    access_code::consume(&codes, &code).await?;

    // Restricted identities get today's fixed assignment when there is one;
    // everyone else gets an independent random draw. An anonymous request
    // cannot be restricted.
    let mut fixed = None;
    if let Some(identity) = &identity {
        if restriction::is_restricted(&restrictions, identity).await? {
            fixed = daily_assignment::today(&assignments).await?;
        }
    }

    let (selected, is_admin_set) = match fixed {
        Some(assignment) => {
            let selected = question::find_by_ids(&questions, &assignment.question_ids).await?;
            (selected, true)
        }
        None => {
            let selected = question::sample(&questions, config.sample_size()).await?;
            (selected, false)
        }
    };

    let mut rng = rand::thread_rng();
    let views = selected
        .into_iter()
        .map(|question| QuestionView::prepare(question, &mut rng))
        .collect();
    Ok(Json(ContentResponse {
        questions: views,
        is_admin_set,
    }))
}
