//! Account data access
//!
//! Balances are only ever written through a row locked with
//! `SELECT ... FOR UPDATE` in the same transaction.

use sqlx::postgres::PgExecutor;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Account, Balance, Iban};

use super::RepositoryError;

/// Read an account without locking it
pub async fn find_by_id<'e, E>(executor: E, account_id: Uuid) -> Result<Option<Account>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, user_id, iban, balance, currency
        FROM accounts
        WHERE id = $1
        "#,
    )
    .bind(account_id)
    .fetch_optional(executor)
    .await?;

    Ok(account)
}

/// Lock every account of one owner, in ascending id order.
///
/// The velocity cap spans all of an owner's accounts, so two withdrawals
/// through different cards of the same owner must not run side by side.
/// Ascending id order matches `lock_pair`, keeping lock acquisition
/// deadlock-free across both paths.
pub async fn lock_for_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<Vec<Account>, RepositoryError> {
    let accounts = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, user_id, iban, balance, currency
        FROM accounts
        WHERE user_id = $1
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(accounts)
}

/// Lock the accounts behind two IBANs.
///
/// Rows are locked in ascending id order regardless of which side is the
/// sender, so two opposite transfers cannot deadlock.
pub async fn lock_pair(
    tx: &mut Transaction<'_, Postgres>,
    first: &Iban,
    second: &Iban,
) -> Result<(Option<Account>, Option<Account>), RepositoryError> {
    let rows = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, user_id, iban, balance, currency
        FROM accounts
        WHERE iban = $1 OR iban = $2
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(first)
    .bind(second)
    .fetch_all(&mut **tx)
    .await?;

    let pick = |iban: &Iban| rows.iter().find(|a| &a.iban == iban).cloned();
    Ok((pick(first), pick(second)))
}

/// Persist a balance computed by an engine
pub async fn update_balance(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    balance: Balance,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET balance = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(account_id)
    .bind(balance)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::RowNotFound(format!("account {}", account_id)));
    }

    Ok(())
}

/// Accounts owned by a user, oldest first
pub async fn list_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Account>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let accounts = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, user_id, iban, balance, currency
        FROM accounts
        WHERE user_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(accounts)
}
