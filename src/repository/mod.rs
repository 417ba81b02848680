//! Repository module
//!
//! Postgres data access for the rate table, accounts, cards and the
//! append-only ledgers. Write-path functions take the open transaction of
//! the caller's unit of work; read-only listings accept any executor.

mod error;

pub mod accounts;
pub mod cards;
pub mod ledger;
pub mod rates;

pub use error::RepositoryError;

use sqlx::{PgPool, Postgres, Transaction};

/// Open a unit of work
pub async fn begin(pool: &PgPool) -> Result<Transaction<'static, Postgres>, RepositoryError> {
    Ok(pool.begin().await?)
}

/// Commit a unit of work. Dropping the transaction instead rolls it back.
pub async fn commit(tx: Transaction<'_, Postgres>) -> Result<(), RepositoryError> {
    tx.commit().await?;
    Ok(())
}
