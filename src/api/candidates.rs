use rocket::{http::Status, serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{
        auth::{Admin, AuthToken},
        candidate::{
            CandidateCreated, CandidateDeleted, CandidateDescription, CandidateSpec,
            CandidateUpdated,
        },
    },
    store::Store,
};
use crate::service::{lifecycle, registry};

pub fn routes() -> Vec<Route> {
    routes![
        list_candidates,
        create_candidate,
        update_candidate,
        delete_candidate,
    ]
}

#[get("/candidates")]
async fn list_candidates(store: &State<Store>) -> Result<Json<Vec<CandidateDescription>>> {
    let candidates = registry::list_candidates(store.as_ref()).await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

#[post("/candidates", data = "<spec>", format = "json")]
async fn create_candidate(
    _token: AuthToken<Admin>,
    spec: Json<CandidateSpec>,
    store: &State<Store>,
) -> Result<(Status, Json<CandidateCreated>)> {
    let candidate = lifecycle::create_candidate(store.as_ref(), spec.0).await?;
    Ok((Status::Created, Json(candidate.into())))
}

#[patch("/candidates/<id>", data = "<spec>", format = "json")]
async fn update_candidate(
    _token: AuthToken<Admin>,
    id: &str,
    spec: Json<CandidateSpec>,
    store: &State<Store>,
) -> Result<Json<CandidateUpdated>> {
    let candidate = lifecycle::update_candidate(store.as_ref(), id, &spec).await?;
    Ok(Json(candidate.into()))
}

#[delete("/candidates/<id>")]
async fn delete_candidate(
    _token: AuthToken<Admin>,
    id: &str,
    store: &State<Store>,
) -> Result<Json<CandidateDeleted>> {
    let id = lifecycle::delete_candidate(store.as_ref(), id).await?;
    Ok(Json(id.into()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::model::{
        api::{
            auth::{examples::bearer, Role},
            ballot::VoterBallot,
        },
        mongodb::Id,
    };

    use super::*;

    fn spec(position: &str, name: &str) -> String {
        serde_json::to_string(&CandidateSpec {
            position: Some(position.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    async fn create(client: &Client, body: String) -> CandidateDescription {
        let response = client
            .post(uri!("/api", create_candidate))
            .header(ContentType::JSON)
            .header(bearer(Id::new(), Role::Admin))
            .body(body)
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let created: CandidateCreated = response.into_json().await.unwrap();
        assert_eq!(created.message, "Candidate added successfully");
        created.new_candidate
    }

    #[backend_test]
    async fn admin_manages_candidates(client: Client) {
        let karim = create(&client, spec("president", "Karim")).await;
        assert_eq!(karim.candidate.votes, 0);
        // Tallies cannot be written directly.
        let salma = create(&client, r#"{"name": "Salma", "votes": 99}"#.to_string()).await;
        assert_eq!(salma.candidate.votes, 0);
        assert_eq!(salma.candidate.position, "");

        let response = client.get(uri!("/api", list_candidates)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let listed: Vec<CandidateDescription> = response.into_json().await.unwrap();
        assert_eq!(listed, vec![karim.clone(), salma.clone()]);

        let id = karim.id.to_string();
        let response = client
            .patch(uri!("/api", update_candidate(&id)))
            .header(ContentType::JSON)
            .header(bearer(Id::new(), Role::Admin))
            .body(r#"{"party": "Green", "votes": 1000}"#)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let updated: CandidateUpdated = response.into_json().await.unwrap();
        assert_eq!(updated.updated_candidate.candidate.party.as_deref(), Some("Green"));
        assert_eq!(updated.updated_candidate.candidate.votes, 0);
        assert_eq!(updated.updated_candidate.candidate.position, "president");

        let response = client
            .delete(uri!("/api", delete_candidate(&id)))
            .header(bearer(Id::new(), Role::Admin))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let deleted: CandidateDeleted = response.into_json().await.unwrap();
        assert_eq!(deleted.deleted_candidate_id, karim.id);

        let response = client
            .delete(uri!("/api", delete_candidate(&id)))
            .header(bearer(Id::new(), Role::Admin))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn bad_ids(client: Client) {
        for (id, expected) in [("12345", Status::BadRequest), ("%20", Status::BadRequest)] {
            let response = client
                .delete(format!("/api/candidates/{id}"))
                .header(bearer(Id::new(), Role::Admin))
                .dispatch()
                .await;
            assert_eq!(expected, response.status(), "{id}");
        }

        let unknown = Id::new().to_string();
        let response = client
            .patch(uri!("/api", update_candidate(&unknown)))
            .header(ContentType::JSON)
            .header(bearer(Id::new(), Role::Admin))
            .body(r#"{"name": "Nobody"}"#)
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn voters_cannot_manage_candidates(client: Client) {
        let response = client
            .post(uri!("/api", create_candidate))
            .header(ContentType::JSON)
            .header(bearer(Id::new(), Role::Voter))
            .body(spec("president", "Karim"))
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
        let error: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(error["error"], "Forbidden: admin only");

        let listed: Vec<CandidateDescription> = client
            .get(uri!("/api", list_candidates))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert!(listed.is_empty());

        let id = Id::new().to_string();
        let response = client
            .delete(uri!("/api", delete_candidate(&id)))
            .header(bearer(Id::new(), Role::Candidate))
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
    }

    #[backend_test]
    async fn deletion_cleans_ballots(client: Client) {
        let karim = create(&client, spec("president", "Karim")).await;
        let salma = create(&client, spec("vp", "Salma")).await;
        let voters = [Id::new(), Id::new(), Id::new()];
        for voter in voters {
            let response = client
                .post("/api/votes")
                .header(ContentType::JSON)
                .header(bearer(voter, Role::Voter))
                .body(format!(r#"{{"candidateId": ["{}", "{}"]}}"#, karim.id, salma.id))
                .dispatch()
                .await;
            assert_eq!(Status::Ok, response.status());
        }

        let id = karim.id.to_string();
        let response = client
            .delete(uri!("/api", delete_candidate(&id)))
            .header(bearer(Id::new(), Role::Admin))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        for voter in voters {
            let ballot: VoterBallot = client
                .get("/api/votes/me")
                .header(bearer(voter, Role::Voter))
                .dispatch()
                .await
                .into_json()
                .await
                .unwrap();
            assert_eq!(ballot.voted.len(), 1);
            assert_eq!(ballot.voted[0].candidate.id, salma.id);
            assert_eq!(ballot.voted_candidates.len(), 1);
        }
    }
}
