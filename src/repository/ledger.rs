//! Withdrawal and transaction ledgers
//!
//! Both tables are append-only: rows are inserted by the engines and read
//! by the velocity check and the reporting rollups. Nothing updates or
//! deletes them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgExecutor;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Currency, NewTransaction, NewWithdrawal, TransactionRecord, WithdrawalRecord};
use crate::reports::{LedgerBucket, LedgerKind};

use super::RepositoryError;

pub async fn insert_withdrawal(
    tx: &mut Transaction<'_, Postgres>,
    record: &NewWithdrawal,
) -> Result<WithdrawalRecord, RepositoryError> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO withdrawals (user_id, amount, currency, commission, commission_currency, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(record.user_id)
    .bind(record.amount)
    .bind(record.currency)
    .bind(record.commission)
    .bind(record.commission_currency)
    .bind(record.created_at)
    .fetch_one(&mut **tx)
    .await?;

    Ok(WithdrawalRecord {
        id,
        user_id: record.user_id,
        amount: record.amount,
        currency: record.currency,
        commission: record.commission,
        commission_currency: record.commission_currency,
        created_at: record.created_at,
    })
}

pub async fn insert_transaction(
    tx: &mut Transaction<'_, Postgres>,
    record: &NewTransaction,
) -> Result<TransactionRecord, RepositoryError> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO transactions (sender_user_id, sender_iban, receiver_iban, amount, currency, commission, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(record.sender_user_id)
    .bind(&record.sender_iban)
    .bind(&record.receiver_iban)
    .bind(record.amount)
    .bind(record.currency)
    .bind(record.commission)
    .bind(record.created_at)
    .fetch_one(&mut **tx)
    .await?;

    Ok(TransactionRecord {
        id,
        sender_user_id: record.sender_user_id,
        sender_iban: record.sender_iban.clone(),
        receiver_iban: record.receiver_iban.clone(),
        amount: record.amount,
        currency: record.currency,
        commission: record.commission,
        created_at: record.created_at,
    })
}

/// Requested-amount subtotals per currency for one user's withdrawals in
/// `[from, to]`
pub async fn withdrawal_totals(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<(Currency, Decimal)>, RepositoryError> {
    let totals: Vec<(Currency, Decimal)> = sqlx::query_as(
        r#"
        SELECT currency, SUM(amount)
        FROM withdrawals
        WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3
        GROUP BY currency
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(&mut **tx)
    .await?;

    Ok(totals)
}

/// Ledger rows in `[from, to]` grouped by UTC day and currencies
pub async fn buckets<'e, E>(
    executor: E,
    kind: LedgerKind,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<LedgerBucket>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    // Transaction commissions are kept in the transaction currency
    let sql = match kind {
        LedgerKind::Transactions => {
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day,
                   currency,
                   currency AS commission_currency,
                   COUNT(*) AS count,
                   SUM(amount) AS amount,
                   SUM(commission) AS commission
            FROM transactions
            WHERE created_at >= $1 AND created_at <= $2
            GROUP BY day, currency
            ORDER BY day
            "#
        }
        LedgerKind::Withdrawals => {
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day,
                   currency,
                   commission_currency,
                   COUNT(*) AS count,
                   SUM(amount) AS amount,
                   SUM(commission) AS commission
            FROM withdrawals
            WHERE created_at >= $1 AND created_at <= $2
            GROUP BY day, currency, commission_currency
            ORDER BY day
            "#
        }
    };

    let rows: Vec<(NaiveDate, Currency, Currency, i64, Decimal, Decimal)> = sqlx::query_as(sql)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(day, currency, commission_currency, count, amount, commission)| LedgerBucket {
            day,
            currency,
            commission_currency,
            count,
            amount,
            commission,
        })
        .collect())
}
