use log::debug;

use crate::error::{Error, Result};
use crate::model::{
    api::{auth::Role, ballot::VoterBallot, results::ElectionResults},
    db::candidate::Candidate,
    mongodb::Id,
    store::ElectionStore,
};

/// Stands in for the caller's own ID when looking up a ballot.
pub const OWN_BALLOT: &str = "me";

pub async fn list_candidates(store: &dyn ElectionStore) -> Result<Vec<Candidate>> {
    store.candidates().await
}

/// Exactly the candidates among `ids` that exist.
pub async fn candidates_by_ids(store: &dyn ElectionStore, ids: &[Id]) -> Result<Vec<Candidate>> {
    store.candidates_by_ids(ids).await
}

/// Every candidate, highest tally first, with the sum of all tallies.
/// Candidates with equal tallies keep their creation order.
pub async fn results(store: &dyn ElectionStore) -> Result<ElectionResults> {
    let mut candidates = store.candidates().await?;
    candidates.sort_by(|a, b| b.votes.cmp(&a.votes));
    let total_votes = candidates.iter().map(|candidate| candidate.votes).sum();
    Ok(ElectionResults {
        total_votes,
        candidates: candidates.into_iter().map(Into::into).collect(),
    })
}

/// Look up a voter's ballot with its candidates resolved.
///
/// `target` is a voter ID or [`OWN_BALLOT`]. Voters may only read their own ballot;
/// administrators may read anyone's.
pub async fn ballot(
    store: &dyn ElectionStore,
    target: &str,
    requester: Id,
    requester_role: Role,
) -> Result<VoterBallot> {
    let target = target.trim();
    let voter_id = if target == OWN_BALLOT {
        requester
    } else {
        target
            .parse()
            .map_err(|_| Error::Validation("Invalid voter id".to_string()))?
    };

    if voter_id != requester && requester_role != Role::Admin {
        debug!("{requester} ({requester_role}) denied access to ballot of {voter_id}");
        return Err(Error::Forbidden(
            "Forbidden: cannot access other voter's votes".to_string(),
        ));
    }

    let voter = store
        .voter(voter_id)
        .await?
        .ok_or_else(|| Error::not_found("Voter"))?;
    let mut referenced = voter.voted_candidates.clone();
    referenced.extend(voter.voted.iter().map(|entry| entry.candidate));
    referenced.sort();
    referenced.dedup();
    let candidates = store.candidates_by_ids(&referenced).await?;
    Ok(VoterBallot::resolve(voter, candidates))
}

#[cfg(test)]
mod tests {
    use crate::model::{db::candidate::CandidateCore, store::MemoryStore};
    use crate::service::cast_vote;

    use super::*;

    #[rocket::async_test]
    async fn results_are_ordered_by_tally() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for (position, name) in [("president", "Karim"), ("vp", "Salma"), ("secretary", "Rahim")] {
            ids.push(
                store
                    .insert_candidate(CandidateCore::example(position, name))
                    .await
                    .unwrap()
                    .id,
            );
        }
        cast_vote(&store, Id::new(), &[ids[1], ids[2]]).await.unwrap();
        cast_vote(&store, Id::new(), &[ids[1]]).await.unwrap();

        let results = results(&store).await.unwrap();
        assert_eq!(results.total_votes, 3);
        let order: Vec<Id> = results.candidates.iter().map(|c| *c.id).collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[0]]);
    }

    #[rocket::async_test]
    async fn by_ids_returns_the_existing_subset() {
        let store = MemoryStore::new();
        let existing = store
            .insert_candidate(CandidateCore::example("president", "Karim"))
            .await
            .unwrap();
        let found = candidates_by_ids(&store, &[Id::new(), existing.id]).await.unwrap();
        assert_eq!(found, vec![existing]);
    }

    #[rocket::async_test]
    async fn ballot_access_rules() {
        let store = MemoryStore::new();
        let president = store
            .insert_candidate(CandidateCore::example("president", "Karim"))
            .await
            .unwrap();
        let voter = Id::new();
        let stranger = Id::new();
        cast_vote(&store, voter, &[president.id]).await.unwrap();

        let own = ballot(&store, OWN_BALLOT, voter, Role::Voter).await.unwrap();
        assert_eq!(*own.id, voter);
        assert_eq!(own.voted.len(), 1);
        assert_eq!(own.voted[0].position, "president");
        assert_eq!(*own.voted_candidates[0].id, president.id);

        let by_admin = ballot(&store, &voter.to_string(), stranger, Role::Admin).await;
        assert!(by_admin.is_ok());

        let err = ballot(&store, &voter.to_string(), stranger, Role::Voter)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)), "{err:?}");

        let err = ballot(&store, OWN_BALLOT, stranger, Role::Voter).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{err:?}");

        let err = ballot(&store, "bogus", voter, Role::Admin).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
    }
}
