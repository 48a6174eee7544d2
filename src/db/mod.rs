//! SQLite-backed implementations of the repository traits.

mod component_repo;
mod favorite_repo;
mod slot_repo;
mod template_repo;

pub use component_repo::SqliteComponentRepository;
pub use favorite_repo::SqliteFavoriteRepository;
pub use slot_repo::SqliteSlotRepository;
pub use template_repo::SqliteTemplateRepository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;

use crate::repo::RepoError;

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        RepoError::Storage(e.to_string())
    }
}

/// Initialize the database connection pool and run migrations.
pub async fn init_db(db_path: PathBuf) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
