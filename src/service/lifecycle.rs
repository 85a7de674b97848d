use log::info;

use crate::error::{Error, Result};
use crate::model::{
    api::candidate::CandidateSpec,
    db::candidate::{Candidate, NewCandidate},
    mongodb::Id,
    store::ElectionStore,
};

/// Register a new candidate from the allow-listed fields. The tally starts at zero.
pub async fn create_candidate(store: &dyn ElectionStore, spec: CandidateSpec) -> Result<Candidate> {
    let candidate = store.insert_candidate(NewCandidate::from(spec)).await?;
    info!(
        "Created candidate {} for position {:?}",
        candidate.id, candidate.position
    );
    Ok(candidate)
}

/// Merge the present fields into an existing candidate.
pub async fn update_candidate(
    store: &dyn ElectionStore,
    raw_id: &str,
    spec: &CandidateSpec,
) -> Result<Candidate> {
    let id = Id::parse_param(raw_id, "candidate")?;
    let candidate = store
        .update_candidate(id, spec)
        .await?
        .ok_or_else(|| Error::not_found("Candidate"))?;
    info!("Updated candidate {id}");
    Ok(candidate)
}

/// Remove a candidate, then strip it from every ballot that references it.
///
/// The cleanup is a separate step from the removal; a voter write racing with it
/// is caught by the voter's version.
pub async fn delete_candidate(store: &dyn ElectionStore, raw_id: &str) -> Result<Id> {
    let id = Id::parse_param(raw_id, "candidate")?;
    if !store.delete_candidate(id).await? {
        return Err(Error::not_found("Candidate"));
    }
    let touched = store.prune_candidate_references(id).await?;
    info!("Deleted candidate {id}, cleaned {touched} voter record(s)");
    Ok(id)
}
