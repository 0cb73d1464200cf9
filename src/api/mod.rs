use rocket::Route;

mod codes;
mod content;
mod daily;
mod restrictions;
mod submission;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(codes::routes());
    routes.extend(content::routes());
    routes.extend(daily::routes());
    routes.extend(restrictions::routes());
    routes.extend(submission::routes());
    routes
}
