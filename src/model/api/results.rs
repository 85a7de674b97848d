use serde::{Deserialize, Serialize};

use crate::model::api::candidate::CandidateDescription;

/// Every candidate in descending tally order, with the sum of all tallies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResults {
    pub total_votes: u64,
    pub candidates: Vec<CandidateDescription>,
}
