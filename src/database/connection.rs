use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use tracing::info;

/// Owns the SQLite connection pool. All state lives here; handlers keep no
/// in-process mutable state between invocations.
#[derive(Clone)]
pub struct DatabaseManager {
    /// The shared connection pool.
    pub pool: SqlitePool,
}

impl DatabaseManager {
    /// Connects to the database, creating the file first if it is missing.
    pub async fn new(database_url: &str) -> Result<Self> {
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            info!("Creating database {}", database_url);
            Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Applies pending migrations from `./migrations`.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
