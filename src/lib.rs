#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{figment::Figment, Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod poll;
pub mod store;

pub use config::Config;

use config::{ConfigFairing, StoreFairing};
use logging::LoggerFairing;
use store::Store;

/// Build the server from `Rocket.toml` and `ROCKET_*` configuration,
/// connecting to whichever store it names.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .mount("/", api::routes())
}

/// Build the server over an already-constructed store, skipping store
/// configuration entirely.
pub fn rocket_for_store(figment: Figment, store: Store) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .manage(store)
        .mount("/", api::routes())
}

/// Admin key used by the test configuration.
#[cfg(test)]
pub(crate) const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Default configuration plus the secrets the tests need.
#[cfg(test)]
pub(crate) fn test_figment() -> Figment {
    rocket::Config::figment().merge(("admin_key", TEST_ADMIN_KEY))
}
