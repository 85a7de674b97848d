use std::collections::HashMap;

use mongodb::bson::DateTime;
use rocket::tokio::sync::Mutex;

use crate::error::Result;
use crate::model::{
    api::{candidate::CandidateSpec, election_config::ElectionConfigSpec},
    db::{
        candidate::{Candidate, NewCandidate},
        election_config::ElectionConfig,
        user::User,
        voter::Voter,
    },
    mongodb::Id,
};

use super::{ElectionStore, VoterWrite};

#[derive(Default)]
struct State {
    config: Option<ElectionConfig>,
    candidates: Vec<Candidate>,
    voters: HashMap<Id, Voter>,
    users: HashMap<Id, User>,
}

/// An in-process store. Each operation holds one lock for its whole duration,
/// which gives the same per-document atomicity the database provides.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a user account known, as the authentication service would.
    pub async fn add_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }
}

#[rocket::async_trait]
impl ElectionStore for MemoryStore {
    async fn election_config(&self) -> Result<Option<ElectionConfig>> {
        Ok(self.state.lock().await.config.clone())
    }

    async fn upsert_election_config(&self, spec: &ElectionConfigSpec) -> Result<ElectionConfig> {
        let now = DateTime::now();
        let mut state = self.state.lock().await;
        let config = state
            .config
            .get_or_insert_with(|| ElectionConfig::with_defaults(now));
        spec.apply_to(config);
        config.updated_at = Some(now);
        Ok(config.clone())
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.state.lock().await.candidates.clone())
    }

    async fn candidates_by_ids(&self, ids: &[Id]) -> Result<Vec<Candidate>> {
        let state = self.state.lock().await;
        Ok(state
            .candidates
            .iter()
            .filter(|candidate| ids.contains(&candidate.id))
            .cloned()
            .collect())
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let candidate = Candidate {
            id: Id::new(),
            candidate,
        };
        self.state.lock().await.candidates.push(candidate.clone());
        Ok(candidate)
    }

    async fn update_candidate(&self, id: Id, spec: &CandidateSpec) -> Result<Option<Candidate>> {
        let mut state = self.state.lock().await;
        Ok(state
            .candidates
            .iter_mut()
            .find(|candidate| candidate.id == id)
            .map(|candidate| {
                spec.apply_to(candidate);
                candidate.clone()
            }))
    }

    async fn delete_candidate(&self, id: Id) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.candidates.len();
        state.candidates.retain(|candidate| candidate.id != id);
        Ok(state.candidates.len() != before)
    }

    async fn increment_tally(&self, id: Id) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.candidates.iter_mut().find(|c| c.id == id) {
            Some(candidate) => {
                candidate.votes += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn voter(&self, id: Id) -> Result<Option<Voter>> {
        Ok(self.state.lock().await.voters.get(&id).cloned())
    }

    async fn write_voter(
        &self,
        voter: &Voter,
        expected_version: Option<u64>,
    ) -> Result<VoterWrite> {
        let mut state = self.state.lock().await;
        let stored_version = state.voters.get(&voter.id).map(|stored| stored.version);
        if stored_version != expected_version {
            return Ok(VoterWrite::Stale);
        }
        state.voters.insert(voter.id, voter.clone());
        Ok(VoterWrite::Committed)
    }

    async fn prune_candidate_references(&self, candidate: Id) -> Result<u64> {
        let mut state = self.state.lock().await;
        let mut touched = 0;
        for voter in state.voters.values_mut() {
            if voter.forget_candidate(candidate) {
                voter.version += 1;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn user_display_name(&self, id: Id) -> Result<Option<String>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).and_then(User::display_name))
    }
}
