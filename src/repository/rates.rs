//! Rate table accessor
//!
//! Every engine call reads the table fresh inside its own transaction.
//! Nothing is cached between requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgExecutor;
use sqlx::{Postgres, Transaction};

use crate::domain::{Currency, ExchangeRate, RateSheet};

use super::RepositoryError;

/// Directed rate `from -> to`, `None` when no row exists
pub async fn get_rate(
    tx: &mut Transaction<'_, Postgres>,
    from: Currency,
    to: Currency,
) -> Result<Option<Decimal>, RepositoryError> {
    let rate: Option<Decimal> = sqlx::query_scalar(
        r#"
        SELECT rate FROM exchange_rates
        WHERE from_currency = $1 AND to_currency = $2
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(rate)
}

/// Load the given pairs into a sheet. Pairs without a row are left out so
/// the engine reports them as `ExchangeRateNotFound`.
pub async fn load_sheet(
    tx: &mut Transaction<'_, Postgres>,
    pairs: &[(Currency, Currency)],
) -> Result<RateSheet, RepositoryError> {
    let mut sheet = RateSheet::new();
    for (from, to) in pairs {
        if let Some(rate) = get_rate(tx, *from, *to).await? {
            sheet.insert(*from, *to, rate);
        }
    }
    Ok(sheet)
}

/// Whole table as a sheet, for read-side rollups
pub async fn load_all<'e, E>(executor: E) -> Result<RateSheet, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<(Currency, Currency, Decimal)> = sqlx::query_as(
        r#"
        SELECT from_currency, to_currency, rate FROM exchange_rates
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .fold(RateSheet::new(), |sheet, (from, to, rate)| sheet.with_rate(from, to, rate)))
}

/// Insert or replace the rate for one directed pair
pub async fn upsert(
    tx: &mut Transaction<'_, Postgres>,
    from: Currency,
    to: Currency,
    rate: Decimal,
    updated_at: DateTime<Utc>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO exchange_rates (from_currency, to_currency, rate, last_updated)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (from_currency, to_currency)
        DO UPDATE SET rate = $3, last_updated = $4
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(rate)
    .bind(updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// All stored rates, most recently updated first
pub async fn list<'e, E>(executor: E) -> Result<Vec<ExchangeRate>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<(Currency, Currency, Decimal, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT from_currency, to_currency, rate, last_updated
        FROM exchange_rates
        ORDER BY last_updated DESC, from_currency, to_currency
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(from, to, rate, last_updated)| ExchangeRate {
            from,
            to,
            rate,
            last_updated,
        })
        .collect())
}
