use std::collections::{HashMap, HashSet};

use log::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::model::{
    common::ballot::BallotEntry,
    db::{candidate::Candidate, election_config::ElectionConfig, voter::Voter},
    mongodb::Id,
    store::{ElectionStore, VoterWrite},
};
use crate::service::registry;

/// How many times a vote is re-validated after losing a race on the voter record.
pub const MAX_ATTEMPTS: usize = 5;

/// Cast one ballot entry per selected candidate for the given voter.
///
/// The whole selection is validated against the election rules and the voter's existing
/// ballot before anything is written; on any rejection nothing changes. The voter record
/// is committed with a conditional write, and tallies are incremented only once that
/// write has landed. Returns the voter's full ballot after the vote.
pub async fn cast_vote(
    store: &dyn ElectionStore,
    voter_id: Id,
    selection: &[Id],
) -> Result<Vec<BallotEntry>> {
    if selection.is_empty() {
        return Err(Error::Validation("Missing candidateId".to_string()));
    }

    let config = store.election_config().await?;
    let candidates = resolve_selection(store, selection).await?;

    for attempt in 1..=MAX_ATTEMPTS {
        let stored = store.voter(voter_id).await?;
        let expected_version = stored.as_ref().map(|voter| voter.version);
        let mut voter = match stored {
            Some(voter) => voter,
            None => {
                let name = store.user_display_name(voter_id).await?.unwrap_or_default();
                Voter::new(voter_id, name)
            }
        };

        if let Err(err) = check_ballot(&voter, &candidates, config.as_ref()) {
            debug!("Rejected vote by {voter_id}: {err}");
            return Err(err);
        }

        for candidate in &candidates {
            voter.record_vote(candidate);
        }
        voter.version = expected_version.map_or(1, |version| version + 1);

        match store.write_voter(&voter, expected_version).await? {
            VoterWrite::Committed => {
                let pruned = apply_tallies(store, voter_id, &candidates).await?;
                info!(
                    "Voter {voter_id} cast {} vote(s), {} in total",
                    candidates.len(),
                    voter.voted.len()
                );
                let mut voted = voter.voter.voted;
                voted.retain(|entry| !pruned.contains(&entry.candidate));
                return Ok(voted);
            }
            VoterWrite::Stale => {
                debug!("Voter {voter_id} changed concurrently (attempt {attempt}/{MAX_ATTEMPTS})");
            }
        }
    }

    warn!("Giving up on vote by {voter_id} after {MAX_ATTEMPTS} conflicting attempts");
    Err(Error::Conflict(
        "Ballot changed concurrently, please try again".to_string(),
    ))
}

/// Look up every selected candidate, in selection order.
/// Fails if any of them does not exist. An ID listed twice counts as missing,
/// since the store only finds it once.
async fn resolve_selection(store: &dyn ElectionStore, selection: &[Id]) -> Result<Vec<Candidate>> {
    let found: HashMap<Id, Candidate> = registry::candidates_by_ids(store, selection)
        .await?
        .into_iter()
        .map(|candidate| (candidate.id, candidate))
        .collect();
    if found.len() != selection.len() {
        return Err(Error::not_found("One or more candidates"));
    }

    selection
        .iter()
        .map(|id| {
            found
                .get(id)
                .cloned()
                .ok_or_else(|| Error::not_found("One or more candidates"))
        })
        .collect()
}

/// Check the selection against the voter's ballot so far and the election rules.
///
/// A missing configuration means no vote limit and one vote per position.
fn check_ballot(
    voter: &Voter,
    selected: &[Candidate],
    config: Option<&ElectionConfig>,
) -> Result<()> {
    let mut requested = HashSet::new();
    for candidate in selected {
        if !requested.insert(candidate.position.as_str()) {
            return Err(Error::Conflict(format!(
                "Multiple candidates for same position in request: {}",
                candidate.position
            )));
        }
    }

    let voted = voter.voted_positions();
    if let Some(position) = requested.iter().find(|position| voted.contains(*position)) {
        return Err(Error::Conflict(format!(
            "You have already voted for position: {position}"
        )));
    }

    // With multiple positions allowed the total is not capped.
    let allow_multiple = config.map_or(false, |config| config.allow_multiple_positions);
    if let Some(limit) = config.and_then(ElectionConfig::vote_limit) {
        let total = voter.voted.len() + selected.len();
        if !allow_multiple && total > limit.get() as usize {
            return Err(Error::Conflict(format!(
                "Vote limit exceeded. Max votes allowed: {limit}"
            )));
        }
    }

    Ok(())
}

/// Add one to each selected candidate's tally.
///
/// A candidate that disappeared after validation has its references pruned again,
/// since the voter write may have landed after the deletion cascade ran.
/// Returns the IDs that were pruned.
async fn apply_tallies(
    store: &dyn ElectionStore,
    voter_id: Id,
    candidates: &[Candidate],
) -> Result<Vec<Id>> {
    let mut pruned = Vec::new();
    for (applied, candidate) in candidates.iter().enumerate() {
        let existed = store.increment_tally(candidate.id).await.map_err(|err| {
            error!(
                "Voter {voter_id} recorded but only {applied}/{} tallies incremented: {err}",
                candidates.len()
            );
            err
        })?;
        if !existed {
            warn!(
                "Candidate {} was deleted during a vote by {voter_id}, pruning",
                candidate.id
            );
            store.prune_candidate_references(candidate.id).await?;
            pruned.push(candidate.id);
        }
    }
    Ok(pruned)
}
