use std::num::NonZeroU32;

use mongodb::bson::{ser::Error as BsonSerError, to_document, DateTime, Document};
use serde::{Deserialize, Serialize};

use crate::model::{common::election::ResultVisibility, mongodb::Id};

pub const DEFAULT_VOTING_METHOD: &str = "online";
pub const DEFAULT_MAX_VOTES_PER_VOTER: u32 = 1;

/// Fields that receive a default when the document is first created.
const DEFAULTED_FIELDS: [&str; 6] = [
    "electionTitle",
    "votingMethod",
    "maxVotesPerVoter",
    "allowMultiplePositions",
    "resultVisibility",
    "isActive",
];

fn default_voting_method() -> String {
    DEFAULT_VOTING_METHOD.to_string()
}

/// The single election configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionConfig {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(default)]
    pub election_title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime>,
    #[serde(default)]
    pub end_date: Option<DateTime>,
    #[serde(default = "default_voting_method")]
    pub voting_method: String,
    /// Zero or null means there is no limit.
    #[serde(default)]
    pub max_votes_per_voter: Option<u32>,
    #[serde(default)]
    pub allow_multiple_positions: bool,
    #[serde(default)]
    pub result_visibility: ResultVisibility,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub settings: Option<Document>,
    #[serde(default)]
    pub created_at: Option<DateTime>,
    #[serde(default)]
    pub updated_at: Option<DateTime>,
}

impl ElectionConfig {
    /// A freshly created configuration, holding only the defaults.
    pub fn with_defaults(now: DateTime) -> Self {
        Self {
            id: Id::new(),
            election_title: String::new(),
            description: None,
            start_date: None,
            end_date: None,
            voting_method: default_voting_method(),
            max_votes_per_voter: Some(DEFAULT_MAX_VOTES_PER_VOTER),
            allow_multiple_positions: false,
            result_visibility: ResultVisibility::default(),
            created_by: None,
            is_active: false,
            settings: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// The values a newly inserted document receives for fields the writer did not set.
    pub fn insert_defaults() -> Result<Document, BsonSerError> {
        let fresh = to_document(&Self::with_defaults(DateTime::now()))?;
        Ok(fresh
            .into_iter()
            .filter(|(key, _)| DEFAULTED_FIELDS.contains(&key.as_str()))
            .collect())
    }

    /// The cap on a voter's total number of votes, if there is one.
    pub fn vote_limit(&self) -> Option<NonZeroU32> {
        self.max_votes_per_voter.and_then(NonZeroU32::new)
    }
}
