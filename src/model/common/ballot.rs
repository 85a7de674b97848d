use serde::{Deserialize, Serialize};

use crate::model::mongodb::{string_or_null, Id};

/// One line of a voter's ballot record: the position voted and the candidate chosen.
///
/// The empty position is a real position of its own, shared by every candidate
/// that is not standing for anything in particular.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotEntry {
    /// Entry ID, present on entries written by earlier versions of the service.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, deserialize_with = "string_or_null")]
    pub position: String,
    pub candidate: Id,
}
