pub mod queries;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Error;

pub use queries::categories::Category;
pub use queries::questions::{NewQuestion, Question};

/// Path that opens a private in-memory database instead of a file.
pub const IN_MEMORY: &str = ":memory:";

/// Error kinds surfaced by the storage layer.
///
/// Handlers decide per endpoint which HTTP status each kind becomes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(Error),
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        match error {
            Error::Database(db_error)
                if db_error.is_unique_violation()
                    || db_error.is_foreign_key_violation()
                    || db_error.is_check_violation() =>
            {
                StoreError::ConstraintViolation(db_error.message().to_owned())
            }
            Error::Database(db_error)
                if matches!(db_error.kind(), sqlx::error::ErrorKind::NotNullViolation) =>
            {
                StoreError::ConstraintViolation(db_error.message().to_owned())
            }
            Error::PoolTimedOut | Error::PoolClosed | Error::Io(_) | Error::Tls(_) => {
                StoreError::Unavailable(error.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub async fn establish_connection(path: &str) -> Result<SqlitePool, Error> {
    if path == IN_MEMORY {
        // every pooled connection would otherwise get its own empty database
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        return SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    let options = SqliteConnectOptions::from_str(format!("sqlite:{}", path).as_str())?
        .create_if_missing(true)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = establish_connection(IN_MEMORY).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
