use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{
        auth::{Admin, AuthToken},
        election_config::{ElectionConfigDescription, ElectionConfigSaved, ElectionConfigSpec},
    },
    store::Store,
};
use crate::service::election_config;

pub fn routes() -> Vec<Route> {
    routes![get_config, set_config]
}

#[get("/election-config")]
async fn get_config(store: &State<Store>) -> Result<Json<ElectionConfigDescription>> {
    let config = election_config::get_config(store.as_ref()).await?;
    Ok(Json(config.into()))
}

#[post("/election-config", data = "<spec>", format = "json")]
async fn set_config(
    _token: AuthToken<Admin>,
    spec: Json<ElectionConfigSpec>,
    store: &State<Store>,
) -> Result<Json<ElectionConfigSaved>> {
    let config = election_config::set_config(store.as_ref(), &spec).await?;
    Ok(Json(config.into()))
}
