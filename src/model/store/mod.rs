//! The persistence capability the election core runs against.
//!
//! Every operation here is atomic on a single document. Nothing spans
//! documents; the callers in [`crate::service`] decide how multi-document
//! work is sequenced.

use std::sync::Arc;

use crate::error::Result;
use crate::model::{
    api::{candidate::CandidateSpec, election_config::ElectionConfigSpec},
    db::{
        candidate::{Candidate, NewCandidate},
        election_config::ElectionConfig,
        voter::Voter,
    },
    mongodb::Id,
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Shared handle to whichever store the server was configured with.
pub type Store = Arc<dyn ElectionStore>;

/// Outcome of a conditional voter write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VoterWrite {
    /// The write landed.
    Committed,
    /// Someone else changed (or created) the voter first; nothing was written.
    Stale,
}

#[rocket::async_trait]
pub trait ElectionStore: Send + Sync {
    /// The election configuration, if one has ever been written.
    async fn election_config(&self) -> Result<Option<ElectionConfig>>;

    /// Create the configuration from defaults plus `spec`, or merge `spec` into the existing one.
    async fn upsert_election_config(&self, spec: &ElectionConfigSpec) -> Result<ElectionConfig>;

    /// All candidates, in creation order.
    async fn candidates(&self) -> Result<Vec<Candidate>>;

    /// The candidates among `ids` that exist. Missing IDs are silently absent.
    async fn candidates_by_ids(&self, ids: &[Id]) -> Result<Vec<Candidate>>;

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate>;

    /// Merge `spec` into the candidate. `None` if there is no such candidate.
    async fn update_candidate(&self, id: Id, spec: &CandidateSpec) -> Result<Option<Candidate>>;

    /// Remove the candidate document. Returns whether it existed.
    async fn delete_candidate(&self, id: Id) -> Result<bool>;

    /// Atomically add one to the candidate's tally. Returns whether the candidate existed.
    async fn increment_tally(&self, id: Id) -> Result<bool>;

    async fn voter(&self, id: Id) -> Result<Option<Voter>>;

    /// Persist `voter`, but only if the stored copy is still at `expected_version`
    /// (`None`: only if no voter with this ID exists yet).
    /// The new document must carry a higher version than `expected_version`.
    async fn write_voter(&self, voter: &Voter, expected_version: Option<u64>)
        -> Result<VoterWrite>;

    /// Strip every reference to the candidate from every voter, bumping each touched voter's
    /// version. Returns the number of voters touched.
    async fn prune_candidate_references(&self, candidate: Id) -> Result<u64>;

    /// The display name of the authenticated user with this ID, if the account is known.
    async fn user_display_name(&self, id: Id) -> Result<Option<String>>;
}
