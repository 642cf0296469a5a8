use std::env;

use kedai_engine::SqliteDatabase;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Creates a fresh, migrated database at a random location and returns its URL.
pub async fn prepare_test_env() -> String {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_path();
    create_database(&url).await;
    run_migrations(&url).await;
    url
}

pub fn random_db_path() -> String {
    let dir = env::temp_dir();
    format!("sqlite://{}/kedai_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 1).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db.close().await;
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("🚀️ Nothing to drop at {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    debug!("🚀️ Created Sqlite database {url}");
}

pub async fn drop_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Error dropping database {url}: {e:?}");
    }
}
