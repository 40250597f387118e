use pls_core::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};

pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";
pub(crate) const UNIQUE_VIOLATION: &str = "23505";
pub(crate) const CHECK_VIOLATION: &str = "23514";
const SERIALIZATION_FAILURE: &str = "40001";

/// Maps an unexpected sqlx error, separating an unreachable store from bugs.
pub(crate) fn store_error(context: &str, error: sqlx::Error) -> AppError {
    let unavailable = match &error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(database_error) => {
            database_error.code().as_deref() == Some(SERIALIZATION_FAILURE)
        }
        _ => false,
    };

    if unavailable {
        tracing::warn!(context, error = %error, "store unavailable");
        AppError::StoreUnavailable(format!("{context}: {error}"))
    } else {
        AppError::Internal(format!("{context}: {error}"))
    }
}

/// Returns the SQLSTATE of a database error.
pub(crate) fn database_code(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(database_error) => {
            database_error.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

/// Returns the table reported by a constraint violation.
pub(crate) fn violated_table(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(database_error) => database_error.table().map(str::to_owned),
        _ => None,
    }
}

/// Begins a read-write transaction.
pub(crate) async fn begin(pool: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    pool.begin()
        .await
        .map_err(|error| store_error("failed to begin transaction", error))
}

/// Begins a read-only snapshot used for resolution.
pub(crate) async fn begin_snapshot(pool: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    let mut transaction = begin(pool).await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to open read snapshot", error))?;

    Ok(transaction)
}

/// Commits a transaction.
pub(crate) async fn commit(transaction: Transaction<'static, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| store_error("failed to commit transaction", error))
}
