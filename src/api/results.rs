use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{
        auth::{Admin, AuthToken},
        results::ElectionResults,
    },
    store::Store,
};
use crate::service::registry;

pub fn routes() -> Vec<Route> {
    routes![results]
}

/// Results are for administrators whatever the configured visibility.
#[get("/results")]
async fn results(_token: AuthToken<Admin>, store: &State<Store>) -> Result<Json<ElectionResults>> {
    Ok(Json(registry::results(store.as_ref()).await?))
}
