use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::{candidate::CandidateDescription, id::ApiId},
    common::ballot::BallotEntry,
    db::{candidate::Candidate, voter::Voter},
    mongodb::Id,
};

/// A vote request: `candidateId` is either one ID or a list of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default)]
    pub candidate_id: Option<CandidateSelection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateSelection {
    One(String),
    Many(Vec<String>),
}

impl VoteRequest {
    /// The selected candidate IDs, in request order.
    ///
    /// Fails if nothing was selected or any ID is malformed.
    pub fn selection(&self) -> Result<Vec<Id>> {
        let raw: Vec<&str> = match &self.candidate_id {
            Some(CandidateSelection::One(id)) => vec![id.as_str()],
            Some(CandidateSelection::Many(ids)) => ids.iter().map(String::as_str).collect(),
            None => vec![],
        };
        if raw.is_empty() {
            return Err(Error::Validation("Missing candidateId".to_string()));
        }
        raw.into_iter()
            .map(|id| {
                id.trim()
                    .parse()
                    .map_err(|_| Error::Validation(format!("Malformed candidate id: {id}")))
            })
            .collect()
    }
}

/// A ballot entry as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotEntryDescription {
    pub position: String,
    pub candidate: ApiId,
}

impl From<BallotEntry> for BallotEntryDescription {
    fn from(entry: BallotEntry) -> Self {
        Self {
            position: entry.position,
            candidate: entry.candidate.into(),
        }
    }
}

/// The response to a successful vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub message: String,
    pub voted: Vec<BallotEntryDescription>,
}

impl VoteReceipt {
    pub fn new(voted: Vec<BallotEntry>) -> Self {
        Self {
            message: "Vote cast successfully".to_string(),
            voted: voted.into_iter().map(Into::into).collect(),
        }
    }
}

/// A ballot entry with its candidate resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedBallotEntry {
    pub position: String,
    pub candidate: CandidateDescription,
}

/// A voter's full ballot record, with candidate references resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterBallot {
    pub id: ApiId,
    pub name: String,
    pub voted_candidates: Vec<CandidateDescription>,
    pub voted: Vec<ResolvedBallotEntry>,
}

impl VoterBallot {
    /// Join the voter's references against the given candidates.
    /// References to candidates not in the list are left out.
    pub fn resolve(voter: Voter, candidates: Vec<Candidate>) -> Self {
        let by_id: HashMap<Id, CandidateDescription> = candidates
            .into_iter()
            .map(|candidate| (candidate.id, candidate.into()))
            .collect();
        let voted_candidates = voter
            .voted_candidates
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect();
        let voted = voter
            .voted
            .iter()
            .filter_map(|entry| {
                by_id.get(&entry.candidate).map(|candidate| ResolvedBallotEntry {
                    position: entry.position.clone(),
                    candidate: candidate.clone(),
                })
            })
            .collect();
        Self {
            id: voter.id.into(),
            name: voter.voter.name,
            voted_candidates,
            voted,
        }
    }
}
