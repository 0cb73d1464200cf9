use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::daily::{DailyAssignmentDescription, DailyAssignmentSpec, QuestionSummary},
    db::{
        daily_assignment::{self, DailyAssignment, NewDailyAssignment},
        question::{self, Question},
    },
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![get_assignment, put_assignment, delete_assignment, list_questions]
}

#[get("/daily-assignment")]
async fn get_assignment(
    assignments: Coll<DailyAssignment>,
) -> Result<Json<DailyAssignmentDescription>> {
    let assignment = daily_assignment::today(&assignments)
        .await?
        .ok_or_else(|| Error::not_found("No assignment for today"))?;
    Ok(Json(assignment.into()))
}

/// Install a curated assignment for today, superseding the automatic one.
#[put("/daily-assignment", data = "<spec>")]
async fn put_assignment(
    spec: Json<DailyAssignmentSpec>,
    assignments: Coll<NewDailyAssignment>,
) -> Result<Json<DailyAssignmentDescription>> {
    let spec = spec.0;
    let assignment =
        daily_assignment::set_manual(&assignments, spec.question_ids, spec.created_by).await?;
    info!(
        "Installed manual daily assignment with {} questions",
        assignment.question_ids.len()
    );
    Ok(Json(assignment.into()))
}

/// The full question pool, summarised for the curation picker.
#[get("/questions")]
async fn list_questions(questions: Coll<Question>) -> Result<Json<Vec<QuestionSummary>>> {
    let pool = question::list_all(&questions).await?;
    Ok(Json(pool.into_iter().map(Into::into).collect()))
}

/// Drop today's assignment. Quiz requests fall back to random draws until
/// the scheduler or an admin creates a new one.
#[delete("/daily-assignment")]
async fn delete_assignment(assignments: Coll<DailyAssignment>) -> Result<()> {
    if !daily_assignment::reset(&assignments).await? {
        return Err(Error::not_found("No assignment for today"));
    }
    info!("Reset today's daily assignment");
    Ok(())
}
