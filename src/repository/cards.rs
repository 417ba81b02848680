//! Card data access
//!
//! The PIN column is written here and never selected.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

use crate::domain::{Card, CardNumber, Pin};

use super::RepositoryError;

/// Card by number, expired or not
pub async fn find_by_number<'e, E>(
    executor: E,
    card_number: &CardNumber,
) -> Result<Option<Card>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let card = sqlx::query_as::<_, Card>(
        r#"
        SELECT id, card_number, expires_at, account_id
        FROM cards
        WHERE card_number = $1
        "#,
    )
    .bind(card_number)
    .fetch_optional(executor)
    .await?;

    Ok(card)
}

/// Set a new PIN on a card that is still valid at `now`.
/// Returns false when no such card exists.
pub async fn update_pin<'e, E>(
    executor: E,
    card_number: &CardNumber,
    pin: &Pin,
    now: DateTime<Utc>,
) -> Result<bool, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE cards
        SET pin = $2, updated_at = NOW()
        WHERE card_number = $1 AND expires_at > $3
        "#,
    )
    .bind(card_number)
    .bind(pin.as_str())
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Cards attached to any account of the user
pub async fn list_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Card>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let cards = sqlx::query_as::<_, Card>(
        r#"
        SELECT c.id, c.card_number, c.expires_at, c.account_id
        FROM cards c
        JOIN accounts a ON a.id = c.account_id
        WHERE a.user_id = $1
        ORDER BY c.expires_at DESC, c.id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(cards)
}
