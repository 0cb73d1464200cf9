#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod scheduled_task;

pub use config::Config;

/// Assemble the full server: routes plus the fairings that load config,
/// connect to the database, set up the notifier, and spawn the background
/// timers. Fairing order matters: the scheduler needs the database and
/// config to already be in managed state.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(logging::LoggerFairing)
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(config::NotifierFairing)
        .attach(scheduled_task::SchedulerFairing)
}
