// gibbot-core/src/db/mod.rs

pub mod migrations;
pub mod schema;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use tracing::info;

use gibbot_common::Error;

use crate::config::Config;

/// Wrapper around the sqlite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) the store at `database_path`. `":memory:"` opens a
    /// private in-memory store for tests.
    pub async fn new(database_path: &str) -> Result<Self, Error> {
        let pool = if database_path == ":memory:" {
            // a single persistent connection, otherwise every pool checkout
            // would see its own empty in-memory store
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::new().in_memory(true).foreign_keys(true))
                .await?
        } else {
            if let Some(parent) = std::path::Path::new(database_path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(database_path)
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .page_size(8192)
                .pragma("cache_size", "-15000")
                .pragma("temp_store", "MEMORY");

            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        info!("connected to sqlite database at {}", database_path);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Bring the store up to the latest schema version. Returns whether any
    /// changeset was applied; when it returns `true` the bumped version has
    /// been written into `config` and the caller must persist the document.
    /// An up-to-date store is a pure no-op.
    pub async fn migrate(&self, config: &mut Config) -> Result<bool, Error> {
        let mut changesets = schema::migrations();
        let mut tx = self.pool.begin().await?;
        match migrations::run_migrations(&mut tx, config.database.version, &mut changesets).await? {
            Some(version) => {
                tx.commit().await?;
                info!(
                    "migrated schema from version {} to {}",
                    config.database.version, version
                );
                config.database.version = version;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
