#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
mod validation;
#[cfg(test)]
mod test;

use std::str::FromStr;

use auth::{AdminPolicy, PasswordHasher, StaticSecretPolicy};
use env::{Settings, load_environment};
use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use telemetry::{TelemetryFairing, init_tracing, shutdown_telemetry};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Rocket failed to launch: {0}")]
    Launch(String),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    if let Err(e) = load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }

    init_tracing();

    let settings = Settings::from_env()?;
    let pool = connect(&settings).await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed successfully");

    let launched = init_rocket(pool, &settings).launch().await;

    shutdown_telemetry();

    match launched {
        Ok(_) => Ok(()),
        Err(e) => Err(Error::Launch(format!("{:?}", e.kind()))),
    }
}

async fn connect(settings: &Settings) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&settings.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(options)
        .await
}

pub fn init_rocket(pool: SqlitePool, settings: &Settings) -> Rocket<Build> {
    info!("Starting questup");

    let policy: Box<dyn AdminPolicy> = Box::new(StaticSecretPolicy::new(
        settings.admin_secret.clone(),
        settings.admin_login.clone(),
    ));

    rocket::build()
        .manage(pool)
        .manage(policy)
        .manage(PasswordHasher::new(settings.bcrypt_cost))
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(TelemetryFairing)
}
