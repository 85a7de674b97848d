use std::sync::Arc;

use log::{error, info, warn};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    mongodb::ensure_indexes_exist,
    store::{MemoryStore, MongoStore, Store},
};

pub const DEFAULT_DB_NAME: &str = "online_voting";

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // secrets
    jwt_secret: String,
}

impl Config {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Secret key the authentication service signs JWTs with.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the store fairing and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    #[serde(default)]
    db_uri: Option<String>,
    // non-secrets
    #[serde(default = "default_db_name")]
    db_name: String,
}

fn default_db_name() -> String {
    DEFAULT_DB_NAME.to_string()
}

/// A fairing that loads the database config, connects to MongoDB,
/// ensures the indexes exist, and places the resulting [`Store`] into
/// managed state. Without a `db_uri` an in-process store is used instead.
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Election store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let Some(db_uri) = config.db_uri else {
            warn!("No `db_uri` configured, votes will only be kept in memory");
            let store: Store = Arc::new(MemoryStore::new());
            return Ok(rocket.manage(store));
        };

        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name(config.db_name));

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        let store: Store = Arc::new(MongoStore::new(&db));
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name(configured: String) -> String {
    configured
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name(configured: String) -> String {
    let random: u32 = rand::random();
    let db = format!("{configured}_test{random}");
    info!("Using database {db}");
    db
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use super::*;

    pub const JWT_SECRET: &str = "test-only-jwt-secret";

    impl Config {
        pub fn example() -> Self {
            Self::new(JWT_SECRET)
        }
    }

    /// The figment test servers are built from: defaults plus the test secret.
    pub fn figment() -> rocket::figment::Figment {
        rocket::Config::figment().merge(("jwt_secret", JWT_SECRET))
    }

    /// Connect to the database named by `ROCKET_DB_URI`, under a fresh random name.
    pub async fn database() -> mongodb::Database {
        let config: DbConfig = figment().extract().unwrap();
        let db_uri = config
            .db_uri
            .expect("`ROCKET_DB_URI` must be set for database tests");
        let client = MongoClient::with_uri_str(db_uri).await.unwrap();
        let db = client.database(&get_database_name(config.db_name));
        ensure_indexes_exist(&db).await.unwrap();
        db
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::Figment;

    use super::*;

    #[rocket::async_test]
    async fn memory_store_without_db_uri() {
        let figment = Figment::from(rocket::Config::debug_default())
            .merge(("jwt_secret", examples::JWT_SECRET));
        let rocket = rocket::custom(figment)
            .attach(ConfigFairing)
            .attach(StoreFairing)
            .ignite()
            .await
            .unwrap();

        assert_eq!(
            rocket.state::<Config>().unwrap().jwt_secret(),
            examples::JWT_SECRET.as_bytes()
        );
        let store = rocket.state::<Store>().unwrap();
        assert_eq!(store.candidates().await.unwrap(), vec![]);
    }

    #[rocket::async_test]
    async fn missing_secret_fails_ignition() {
        let figment = Figment::from(rocket::Config::debug_default());
        let result = rocket::custom(figment).attach(ConfigFairing).ignite().await;
        assert!(result.is_err());
        // rocket::Error panics on drop unless inspected; mark it handled.
        if let Err(e) = result {
            let _ = e.kind();
        }
    }
}
