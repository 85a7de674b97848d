use log::debug;
use rocket::{
    serde::json::{self, Json},
    Route, State,
};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        ballot::{VoteReceipt, VoteRequest, VoterBallot},
    },
    store::Store,
};
use crate::service::{cast_vote, registry};

pub fn routes() -> Vec<Route> {
    routes![cast, get_ballot]
}

#[post("/votes", data = "<request>", format = "json")]
async fn cast(
    token: AuthToken,
    request: std::result::Result<Json<VoteRequest>, json::Error<'_>>,
    store: &State<Store>,
) -> Result<Json<VoteReceipt>> {
    let request = request.map_err(|err| {
        debug!("Unreadable vote request: {err}");
        Error::Validation("Malformed vote request".to_string())
    })?;
    let selection = request.selection()?;
    let voted = cast_vote(store.as_ref(), token.id, &selection).await?;
    Ok(Json(VoteReceipt::new(voted)))
}

#[get("/votes/<voter_id>")]
async fn get_ballot(
    token: AuthToken,
    voter_id: &str,
    store: &State<Store>,
) -> Result<Json<VoterBallot>> {
    let ballot = registry::ballot(store.as_ref(), voter_id, token.id, token.role).await?;
    Ok(Json(ballot))
}
