use log::debug;
use mongodb::{
    bson::{doc, to_document, DateTime, Document},
    options::{FindOneAndUpdateOptions, FindOneOptions, ReturnDocument},
    Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    api::{candidate::CandidateSpec, election_config::ElectionConfigSpec},
    db::{
        candidate::{Candidate, NewCandidate},
        election_config::ElectionConfig,
        user::User,
        voter::Voter,
    },
    mongodb::{is_duplicate_key_error, Coll, Id},
};

use super::{ElectionStore, VoterWrite};

/// The production store, backed by MongoDB.
#[derive(Clone)]
pub struct MongoStore {
    candidates: Coll<Candidate>,
    new_candidates: Coll<NewCandidate>,
    voters: Coll<Voter>,
    configs: Coll<ElectionConfig>,
    users: Coll<User>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            candidates: Coll::from_db(db),
            new_candidates: Coll::from_db(db),
            voters: Coll::from_db(db),
            configs: Coll::from_db(db),
            users: Coll::from_db(db),
        }
    }
}

/// Newest first, in case more than one configuration document ever exists.
fn newest_config() -> Document {
    doc! {"updatedAt": -1}
}

#[rocket::async_trait]
impl ElectionStore for MongoStore {
    async fn election_config(&self) -> Result<Option<ElectionConfig>> {
        let options = FindOneOptions::builder().sort(newest_config()).build();
        Ok(self.configs.find_one(None, options).await?)
    }

    async fn upsert_election_config(&self, spec: &ElectionConfigSpec) -> Result<ElectionConfig> {
        let now = DateTime::now();
        let mut set = spec.to_set_doc();
        set.insert("updatedAt", now);
        // A field may not appear in both `$set` and `$setOnInsert`.
        let mut on_insert: Document = ElectionConfig::insert_defaults()?
            .into_iter()
            .filter(|(key, _)| !set.contains_key(key))
            .collect();
        on_insert.insert("createdAt", now);

        let update = doc! {
            "$set": set,
            "$setOnInsert": on_insert,
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .sort(newest_config())
            .return_document(ReturnDocument::After)
            .build();
        self.configs
            .find_one_and_update(doc! {}, update, options)
            .await?
            .ok_or_else(|| Error::Internal("Upserted election config was not returned".to_string()))
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.candidates.find(None, None).await?.try_collect().await?)
    }

    async fn candidates_by_ids(&self, ids: &[Id]) -> Result<Vec<Candidate>> {
        let filter = doc! {"_id": {"$in": ids.to_vec()}};
        Ok(self.candidates.find(filter, None).await?.try_collect().await?)
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let result = self.new_candidates.insert_one(&candidate, None).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| Error::Internal("Inserted candidate has no ObjectId".to_string()))?;
        Ok(Candidate {
            id: id.into(),
            candidate,
        })
    }

    async fn update_candidate(&self, id: Id, spec: &CandidateSpec) -> Result<Option<Candidate>> {
        // An empty `$set` is rejected by the server.
        if spec.is_empty() {
            return Ok(self.candidates.find_one(id.as_doc(), None).await?);
        }
        let update = doc! {"$set": spec.to_set_doc()?};
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .candidates
            .find_one_and_update(id.as_doc(), update, options)
            .await?)
    }

    async fn delete_candidate(&self, id: Id) -> Result<bool> {
        let result = self.candidates.delete_one(id.as_doc(), None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn increment_tally(&self, id: Id) -> Result<bool> {
        let result = self
            .candidates
            .update_one(id.as_doc(), doc! {"$inc": {"votes": 1}}, None)
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn voter(&self, id: Id) -> Result<Option<Voter>> {
        Ok(self.voters.find_one(id.as_doc(), None).await?)
    }

    async fn write_voter(
        &self,
        voter: &Voter,
        expected_version: Option<u64>,
    ) -> Result<VoterWrite> {
        let Some(version) = expected_version else {
            // `_id` is unique, so a concurrent first vote loses here.
            return match self.voters.insert_one(voter, None).await {
                Ok(_) => Ok(VoterWrite::Committed),
                Err(e) if is_duplicate_key_error(&e) => {
                    debug!("Voter {} was created concurrently", voter.id);
                    Ok(VoterWrite::Stale)
                }
                Err(e) => Err(e.into()),
            };
        };

        let mut filter = voter.id.as_doc();
        if version == 0 {
            filter.insert(
                "$or",
                vec![doc! {"version": 0}, doc! {"version": {"$exists": false}}],
            );
        } else {
            let version = i64::try_from(version)
                .map_err(|_| Error::Internal(format!("Voter version {version} out of range")))?;
            filter.insert("version", version);
        }
        // `$set` leaves fields this record does not model untouched.
        let update = doc! {"$set": to_document(&voter.voter)?};
        let result = self.voters.update_one(filter, update, None).await?;
        Ok(if result.matched_count == 1 {
            VoterWrite::Committed
        } else {
            VoterWrite::Stale
        })
    }

    async fn prune_candidate_references(&self, candidate: Id) -> Result<u64> {
        let filter = doc! {
            "$or": [
                {"votedCandidates": candidate},
                {"voted.candidate": candidate},
            ]
        };
        let update = doc! {
            "$pull": {
                "votedCandidates": candidate,
                "voted": {"candidate": candidate},
            },
            "$inc": {"version": 1},
        };
        let result = self.voters.update_many(filter, update, None).await?;
        Ok(result.modified_count)
    }

    async fn user_display_name(&self, id: Id) -> Result<Option<String>> {
        let user = self.users.find_one(id.as_doc(), None).await?;
        Ok(user.as_ref().and_then(User::display_name))
    }
}

#[cfg(test)]
mod tests {
    use mongodb::Database;

    use crate::model::db::candidate::CandidateCore;

    use super::*;

    #[backend_test(mongo)]
    async fn config_upsert_keeps_a_single_document(db: Database) {
        let store = MongoStore::new(&db);
        assert_eq!(store.election_config().await.unwrap(), None);

        let created = store
            .upsert_election_config(&ElectionConfigSpec {
                election_title: Some("Hall Council".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.election_title, "Hall Council");
        assert_eq!(created.max_votes_per_voter, Some(1));
        assert!(created.created_at.is_some());

        let updated = store
            .upsert_election_config(&ElectionConfigSpec {
                max_votes_per_voter: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.election_title, "Hall Council");
        assert_eq!(updated.vote_limit(), None);
        assert_eq!(updated.created_at, created.created_at);

        let count = store.configs.count_documents(None, None).await.unwrap();
        assert_eq!(count, 1);
    }

    #[backend_test(mongo)]
    async fn conditional_voter_writes(db: Database) {
        let store = MongoStore::new(&db);
        let candidate = store
            .insert_candidate(CandidateCore::example("president", "Karim"))
            .await
            .unwrap();

        let mut voter = Voter::new(Id::new(), "Rafi".to_string());
        voter.record_vote(&candidate);
        voter.version = 1;
        assert_eq!(
            store.write_voter(&voter, None).await.unwrap(),
            VoterWrite::Committed
        );
        assert_eq!(
            store.write_voter(&voter, None).await.unwrap(),
            VoterWrite::Stale
        );

        voter.version = 2;
        assert_eq!(
            store.write_voter(&voter, Some(0)).await.unwrap(),
            VoterWrite::Stale
        );
        assert_eq!(
            store.write_voter(&voter, Some(1)).await.unwrap(),
            VoterWrite::Committed
        );

        assert!(store.increment_tally(candidate.id).await.unwrap());
        assert_eq!(store.prune_candidate_references(candidate.id).await.unwrap(), 1);
        let voter = store.voter(voter.id).await.unwrap().unwrap();
        assert!(voter.voted.is_empty());
        assert!(voter.voted_candidates.is_empty());
        assert_eq!(voter.version, 3);

        assert!(store.delete_candidate(candidate.id).await.unwrap());
        assert!(!store.increment_tally(candidate.id).await.unwrap());
    }

    #[backend_test(mongo)]
    async fn legacy_voters_without_version_can_be_updated(db: Database) {
        let store = MongoStore::new(&db);
        let id = Id::new();
        db.collection::<Document>("voters")
            .insert_one(
                doc! {"_id": id, "name": "Old", "votedCandidates": [], "voted": []},
                None,
            )
            .await
            .unwrap();

        let mut voter = store.voter(id).await.unwrap().unwrap();
        assert_eq!(voter.version, 0);
        voter.version = 1;
        assert_eq!(
            store.write_voter(&voter, Some(0)).await.unwrap(),
            VoterWrite::Committed
        );
    }

    #[backend_test(mongo)]
    async fn voting_keeps_unmodelled_voter_fields(db: Database) {
        let store = MongoStore::new(&db);
        let earlier = store
            .insert_candidate(CandidateCore::example("secretary", "Salma"))
            .await
            .unwrap();
        let candidate = store
            .insert_candidate(CandidateCore::example("president", "Karim"))
            .await
            .unwrap();
        let id = Id::new();
        let entry_id = Id::new();
        db.collection::<Document>("voters")
            .insert_one(
                doc! {
                    "_id": id,
                    "name": "Old",
                    "nid": "1990123",
                    "address": "Tangail",
                    "votedCandidates": [earlier.id],
                    "voted": [{"_id": entry_id, "position": "secretary", "candidate": earlier.id}],
                },
                None,
            )
            .await
            .unwrap();

        crate::service::cast_vote(&store, id, &[candidate.id])
            .await
            .unwrap();

        let raw = db
            .collection::<Document>("voters")
            .find_one(id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw.get_str("nid").unwrap(), "1990123");
        assert_eq!(raw.get_str("address").unwrap(), "Tangail");
        let voted = raw.get_array("voted").unwrap();
        assert_eq!(voted.len(), 2);
        let first = voted[0].as_document().unwrap();
        assert_eq!(first.get_object_id("_id").unwrap(), *entry_id);
    }
}
