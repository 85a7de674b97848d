use chrono::{DateTime, Utc};
use mongodb::bson::{self, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::election::ResultVisibility,
    db::election_config::ElectionConfig,
};

/// An administrator's write to the election configuration.
/// Present fields overwrite the stored ones; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionConfigSpec {
    #[serde(default)]
    pub election_title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub voting_method: Option<String>,
    /// Zero lifts the limit.
    #[serde(default)]
    pub max_votes_per_voter: Option<u32>,
    #[serde(default)]
    pub allow_multiple_positions: Option<bool>,
    #[serde(default)]
    pub result_visibility: Option<ResultVisibility>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub settings: Option<Document>,
}

/// Zero means "no limit", which is stored as null.
fn stored_limit(max: u32) -> Option<u32> {
    (max != 0).then_some(max)
}

impl ElectionConfigSpec {
    /// The `$set` document for the present fields, without timestamps.
    pub fn to_set_doc(&self) -> Document {
        let mut set = Document::new();
        if let Some(title) = &self.election_title {
            set.insert("electionTitle", title.as_str());
        }
        if let Some(description) = &self.description {
            set.insert("description", description.as_str());
        }
        if let Some(start) = self.start_date {
            set.insert("startDate", bson::DateTime::from_chrono(start));
        }
        if let Some(end) = self.end_date {
            set.insert("endDate", bson::DateTime::from_chrono(end));
        }
        if let Some(method) = &self.voting_method {
            set.insert("votingMethod", method.as_str());
        }
        if let Some(max) = self.max_votes_per_voter {
            set.insert(
                "maxVotesPerVoter",
                stored_limit(max).map_or(Bson::Null, |max| Bson::Int64(max.into())),
            );
        }
        if let Some(allow) = self.allow_multiple_positions {
            set.insert("allowMultiplePositions", allow);
        }
        if let Some(visibility) = self.result_visibility {
            set.insert("resultVisibility", visibility);
        }
        if let Some(created_by) = &self.created_by {
            set.insert("createdBy", created_by.as_str());
        }
        if let Some(active) = self.is_active {
            set.insert("isActive", active);
        }
        if let Some(settings) = &self.settings {
            set.insert("settings", settings.clone());
        }
        set
    }

    /// Merge the present fields into an existing configuration, without timestamps.
    pub fn apply_to(&self, config: &mut ElectionConfig) {
        if let Some(title) = &self.election_title {
            config.election_title = title.clone();
        }
        if let Some(description) = &self.description {
            config.description = Some(description.clone());
        }
        if let Some(start) = self.start_date {
            config.start_date = Some(start.into());
        }
        if let Some(end) = self.end_date {
            config.end_date = Some(end.into());
        }
        if let Some(method) = &self.voting_method {
            config.voting_method = method.clone();
        }
        if let Some(max) = self.max_votes_per_voter {
            config.max_votes_per_voter = stored_limit(max);
        }
        if let Some(allow) = self.allow_multiple_positions {
            config.allow_multiple_positions = allow;
        }
        if let Some(visibility) = self.result_visibility {
            config.result_visibility = visibility;
        }
        if let Some(created_by) = &self.created_by {
            config.created_by = Some(created_by.clone());
        }
        if let Some(active) = self.is_active {
            config.is_active = active;
        }
        if let Some(settings) = &self.settings {
            config.settings = Some(settings.clone());
        }
    }
}

/// The election configuration as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionConfigDescription {
    pub id: ApiId,
    pub election_title: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub voting_method: String,
    /// Null when there is no limit.
    pub max_votes_per_voter: Option<u32>,
    pub allow_multiple_positions: bool,
    pub result_visibility: ResultVisibility,
    pub created_by: Option<String>,
    pub is_active: bool,
    pub settings: Option<Document>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ElectionConfig> for ElectionConfigDescription {
    fn from(config: ElectionConfig) -> Self {
        let max_votes_per_voter = config.vote_limit().map(u32::from);
        Self {
            id: config.id.into(),
            election_title: config.election_title,
            description: config.description,
            start_date: config.start_date.map(bson::DateTime::to_chrono),
            end_date: config.end_date.map(bson::DateTime::to_chrono),
            voting_method: config.voting_method,
            max_votes_per_voter,
            allow_multiple_positions: config.allow_multiple_positions,
            result_visibility: config.result_visibility,
            created_by: config.created_by,
            is_active: config.is_active,
            settings: config.settings,
            created_at: config.created_at.map(bson::DateTime::to_chrono),
            updated_at: config.updated_at.map(bson::DateTime::to_chrono),
        }
    }
}

/// Response to a successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionConfigSaved {
    pub ok: bool,
    pub config: ElectionConfigDescription,
}

impl From<ElectionConfig> for ElectionConfigSaved {
    fn from(config: ElectionConfig) -> Self {
        Self {
            ok: true,
            config: config.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn set_doc_holds_only_present_fields() {
        let spec: ElectionConfigSpec = serde_json::from_str(
            r#"{"maxVotesPerVoter": 0, "resultVisibility": "public", "bogus": 1}"#,
        )
        .unwrap();
        let set = spec.to_set_doc();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("maxVotesPerVoter"), Some(&Bson::Null));
        assert_eq!(set.get_str("resultVisibility").unwrap(), "public");
    }

    #[test]
    fn apply_merges_in_place() {
        let mut config = ElectionConfig::with_defaults(bson::DateTime::now());
        let spec = ElectionConfigSpec {
            election_title: Some("Student Union 2025".to_string()),
            max_votes_per_voter: Some(3),
            allow_multiple_positions: Some(true),
            ..Default::default()
        };
        spec.apply_to(&mut config);

        assert_eq!(config.election_title, "Student Union 2025");
        assert_eq!(config.max_votes_per_voter, Some(3));
        assert!(config.allow_multiple_positions);
        assert_eq!(config.voting_method, "online");
        assert_eq!(config.result_visibility, ResultVisibility::AfterClosure);

        ElectionConfigSpec {
            max_votes_per_voter: Some(0),
            ..Default::default()
        }
        .apply_to(&mut config);
        assert_eq!(config.vote_limit(), None);
    }
}
