use mongodb::bson::{ser::Error as BsonSerError, to_document, Document};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::candidate::{Candidate, CandidateCore, NewCandidate},
    mongodb::Id,
};

/// The administrator-editable candidate fields.
///
/// Used both for creation and for partial updates: absent fields are left alone,
/// and anything not listed here (including the tally) is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifesto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl CandidateSpec {
    /// Does this spec change nothing?
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the present fields into an existing candidate.
    pub fn apply_to(&self, candidate: &mut CandidateCore) {
        fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        fn merge_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        merge(&mut candidate.position, &self.position);
        merge_opt(&mut candidate.name, &self.name);
        merge_opt(&mut candidate.student_id, &self.student_id);
        merge_opt(&mut candidate.department, &self.department);
        merge_opt(&mut candidate.photo_url, &self.photo_url);
        merge(&mut candidate.display_order, &self.display_order);
        merge_opt(&mut candidate.manifesto, &self.manifesto);
        merge_opt(&mut candidate.party, &self.party);
        merge_opt(&mut candidate.symbol, &self.symbol);
    }

    /// The `$set` document for a partial update: only the present fields.
    pub fn to_set_doc(&self) -> Result<Document, BsonSerError> {
        to_document(self)
    }
}

impl From<CandidateSpec> for NewCandidate {
    fn from(spec: CandidateSpec) -> Self {
        let mut candidate = NewCandidate::default();
        spec.apply_to(&mut candidate);
        candidate
    }
}

/// A candidate as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: ApiId,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id.into(),
            candidate: candidate.candidate,
        }
    }
}

/// Response to a successful creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCreated {
    pub message: String,
    pub new_candidate: CandidateDescription,
}

impl From<Candidate> for CandidateCreated {
    fn from(candidate: Candidate) -> Self {
        Self {
            message: "Candidate added successfully".to_string(),
            new_candidate: candidate.into(),
        }
    }
}

/// Response to a successful update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateUpdated {
    pub ok: bool,
    pub message: String,
    pub updated_candidate: CandidateDescription,
}

impl From<Candidate> for CandidateUpdated {
    fn from(candidate: Candidate) -> Self {
        Self {
            ok: true,
            message: "Candidate updated".to_string(),
            updated_candidate: candidate.into(),
        }
    }
}

/// Response to a successful deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDeleted {
    pub ok: bool,
    pub message: String,
    pub deleted_candidate_id: ApiId,
}

impl From<Id> for CandidateDeleted {
    fn from(id: Id) -> Self {
        Self {
            ok: true,
            message: "Candidate deleted and voter references cleaned".to_string(),
            deleted_candidate_id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn unknown_fields_and_tally_are_ignored() {
        let spec: CandidateSpec = serde_json::from_str(
            r#"{"name": "Karim", "position": "general secretary", "votes": 9000, "role": "admin"}"#,
        )
        .unwrap();
        let candidate = NewCandidate::from(spec);
        assert_eq!(candidate.name.as_deref(), Some("Karim"));
        assert_eq!(candidate.position, "general secretary");
        assert_eq!(candidate.votes, 0);
    }

    #[test]
    fn partial_merge_only_touches_present_fields() {
        let mut candidate = CandidateCore::example("president", "Karim");
        candidate.votes = 4;
        let spec = CandidateSpec {
            party: Some("Green".to_string()),
            display_order: Some(3),
            ..Default::default()
        };
        spec.apply_to(&mut candidate);

        assert_eq!(candidate.party.as_deref(), Some("Green"));
        assert_eq!(candidate.display_order, 3);
        assert_eq!(candidate.name.as_deref(), Some("Karim"));
        assert_eq!(candidate.position, "president");
        assert_eq!(candidate.votes, 4);

        let set = spec.to_set_doc().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_str("party").unwrap(), "Green");
        assert_eq!(set.get_i32("displayOrder").unwrap(), 3);
    }
}
