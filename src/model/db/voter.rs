use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{common::ballot::BallotEntry, db::candidate::Candidate, mongodb::Id};

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterCore {
    #[serde(default)]
    pub name: String,
    /// Flat list of every candidate voted for, in voting order.
    #[serde(default)]
    pub voted_candidates: Vec<Id>,
    /// One entry per position voted, in voting order.
    #[serde(default)]
    pub voted: Vec<BallotEntry>,
    /// Bumped on every write; conditional writes use it to detect concurrent changes.
    /// Documents written before versioning was introduced read as version 0.
    #[serde(default)]
    pub version: u64,
}

/// A voter from the database, with its unique ID.
/// The ID is shared with the authenticated user the voter belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Voter {
    /// A voter who has not voted yet and has never been stored.
    pub fn new(id: Id, name: String) -> Self {
        Self {
            id,
            voter: VoterCore {
                name,
                ..Default::default()
            },
        }
    }
}

impl VoterCore {
    /// Every position this voter has already used.
    pub fn voted_positions(&self) -> HashSet<&str> {
        self.voted
            .iter()
            .map(|entry| entry.position.as_str())
            .collect()
    }

    /// Append a vote for the given candidate to both reference lists.
    pub fn record_vote(&mut self, candidate: &Candidate) {
        self.voted_candidates.push(candidate.id);
        self.voted.push(BallotEntry {
            id: None,
            position: candidate.position.clone(),
            candidate: candidate.id,
        });
    }

    /// Does any part of the ballot still reference this candidate?
    pub fn references(&self, candidate: Id) -> bool {
        self.voted_candidates.contains(&candidate)
            || self.voted.iter().any(|entry| entry.candidate == candidate)
    }

    /// Drop every reference to the given candidate.
    /// Returns whether anything was removed.
    pub fn forget_candidate(&mut self, candidate: Id) -> bool {
        if !self.references(candidate) {
            return false;
        }
        self.voted_candidates.retain(|id| *id != candidate);
        self.voted.retain(|entry| entry.candidate != candidate);
        true
    }
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

#[cfg(test)]
mod tests {
    use crate::model::db::candidate::{Candidate, CandidateCore};

    use super::*;

    fn candidate(position: &str) -> Candidate {
        Candidate {
            id: Id::new(),
            candidate: CandidateCore::example(position, "Someone"),
        }
    }

    #[test]
    fn record_and_forget() {
        let president = candidate("president");
        let unaffiliated = candidate("");
        let mut voter = Voter::new(Id::new(), "Rahim".to_string());

        voter.record_vote(&president);
        voter.record_vote(&unaffiliated);
        assert_eq!(voter.voted_candidates, vec![president.id, unaffiliated.id]);
        assert_eq!(
            voter.voted_positions(),
            ["president", ""].into_iter().collect()
        );

        assert!(voter.forget_candidate(president.id));
        assert!(!voter.references(president.id));
        assert_eq!(voter.voted.len(), 1);
        assert_eq!(voter.voted[0].candidate, unaffiliated.id);

        // Nothing left to forget.
        assert!(!voter.forget_candidate(president.id));
    }
}
