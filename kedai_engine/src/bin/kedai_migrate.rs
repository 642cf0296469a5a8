//! Creates the Kedai database if needed and brings its schema up to date.
use std::env::{self, VarError};

use kedai_engine::{config::EngineConfig, SqliteDatabase};
use log::*;

const HELP: &str = r#"
kedai_migrate

Creates the Kedai database (if it does not exist yet) and applies all pending schema migrations.
There are no command-line options. Everything is configured through environment variables, which may also be placed
in a .env file in the working directory.

  KEDAI_DATABASE_URL         The SQLite database URL. Defaults to sqlite://data/kedai.db
  KEDAI_DB_MAX_CONNECTIONS   The connection pool size. Defaults to 25
"#;

const DISPLAY_ENVS: [&str; 9] = [
    "RUST_LOG",
    "KEDAI_DATABASE_URL",
    "KEDAI_DB_MAX_CONNECTIONS",
    "KEDAI_PAYMENT_VALIDITY_MINUTES",
    "KEDAI_PAYMENT_REUSE_MINUTES",
    "KEDAI_PAYMENT_TOLERANCE",
    "KEDAI_MERCHANT_NAME",
    "KEDAI_MERCHANT_CITY",
    "KEDAI_MERCHANT_CATEGORY",
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    if env::args().count() > 1 {
        println!("{HELP}");
        display_envs();
        return;
    }
    let config = EngineConfig::from_env_or_default();
    info!("🗃️ Migrating {}", config.database_url);
    let db = match SqliteDatabase::new_with_url(&config.database_url, config.max_connections).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Could not open {}. {e}", config.database_url);
            std::process::exit(1);
        },
    };
    let result = db.run_migrations().await;
    db.close().await;
    match result {
        Ok(()) => println!("Database {} is up to date.", config.database_url),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    }
}

fn display_envs() {
    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
