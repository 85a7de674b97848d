use std::ops::Deref;

use log::debug;
use mongodb::{bson::doc, error::Error as DbError, Collection, Database, IndexModel};

use crate::model::db::{
    candidate::{Candidate, NewCandidate},
    election_config::ElectionConfig,
    user::User,
    voter::Voter,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Candidate collections
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}
impl MongoCollection for NewCandidate {
    const NAME: &'static str = CANDIDATES;
}

// Voter collection
const VOTERS: &str = "voters";
impl MongoCollection for Voter {
    const NAME: &'static str = VOTERS;
}

// Election config collection
const ELECTION_CONFIGS: &str = "electionconfigs";
impl MongoCollection for ElectionConfig {
    const NAME: &'static str = ELECTION_CONFIGS;
}

// Users are owned by the authentication service; we only ever read them.
const USERS: &str = "users";
impl MongoCollection for User {
    const NAME: &'static str = USERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // Voter collection: the candidate cascade looks voters up by either reference list.
    let voters = Coll::<Voter>::from_db(db);
    let by_ballot_candidate = IndexModel::builder()
        .keys(doc! {"voted.candidate": 1})
        .build();
    voters.create_index(by_ballot_candidate, None).await?;
    let by_voted_candidates = IndexModel::builder()
        .keys(doc! {"votedCandidates": 1})
        .build();
    voters.create_index(by_voted_candidates, None).await?;

    // Candidate collection: results are read in tally order.
    let by_votes = IndexModel::builder().keys(doc! {"votes": -1}).build();
    Coll::<Candidate>::from_db(db)
        .create_index(by_votes, None)
        .await?;

    Ok(())
}
