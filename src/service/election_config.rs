use log::info;

use crate::error::{Error, Result};
use crate::model::{
    api::election_config::ElectionConfigSpec, db::election_config::ElectionConfig,
    store::ElectionStore,
};

/// Create the election configuration, or merge the present fields into it.
pub async fn set_config(store: &dyn ElectionStore, spec: &ElectionConfigSpec) -> Result<ElectionConfig> {
    let config = store.upsert_election_config(spec).await?;
    info!(
        "Election config saved (limit {:?}, multiple positions {}, results {:?})",
        config.vote_limit(),
        config.allow_multiple_positions,
        config.result_visibility
    );
    Ok(config)
}

pub async fn get_config(store: &dyn ElectionStore) -> Result<ElectionConfig> {
    store
        .election_config()
        .await?
        .ok_or_else(|| Error::not_found("Election config"))
}
