#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;
use crate::model::store::Store;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;

pub use config::Config;

/// Build the server from the ambient figment: load the application config
/// and connect to whichever store is configured.
pub fn build() -> Rocket<Build> {
    with_api(rocket::build()).attach(StoreFairing)
}

/// Build the server around an already-constructed store.
/// The application config is still loaded from the given figment.
pub fn rocket_for_store(figment: rocket::figment::Figment, store: Store) -> Rocket<Build> {
    with_api(rocket::custom(figment)).manage(store)
}

/// Everything but the store: fairings, routes and catchers.
fn with_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .mount("/api", api::routes())
        .register("/api", api::catchers())
}
