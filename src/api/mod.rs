use rocket::{
    http::Status,
    serde::json::{json, Json, Value},
    Catcher, Request, Route,
};

use crate::model::api::auth::GuardFailure;

mod candidates;
mod config;
mod results;
mod votes;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(candidates::routes());
    routes.extend(config::routes());
    routes.extend(results::routes());
    routes.extend(votes::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Render every uncaught error as `{ "error": ... }`, using the reason an
/// authentication guard recorded if there is one.
#[catch(default)]
fn default_catcher(status: Status, req: &Request<'_>) -> Json<Value> {
    let message = req
        .local_cache(GuardFailure::default)
        .0
        .clone()
        .unwrap_or_else(|| match status.code {
            400 | 422 => "Invalid request body".to_string(),
            _ => status.reason_lossy().to_string(),
        });
    Json(json!({ "error": message }))
}
