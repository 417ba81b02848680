//! Net-bank read handlers
//!
//! Listings for the authenticated client. Card PINs are never returned.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Account, Card, Currency, Iban};
use crate::error::AppError;
use crate::repository::{accounts, cards};

#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub iban: Iban,
    pub balance: Decimal,
    pub currency: Currency,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            iban: account.iban,
            balance: account.balance.value(),
            currency: account.currency,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    /// Masked card number
    pub card_number: String,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
}

impl CardView {
    fn new(card: Card, now: DateTime<Utc>) -> Self {
        Self {
            card_number: card.card_number.masked(),
            expired: card.is_expired(now),
            expires_at: card.expires_at,
        }
    }
}

pub struct NetBankHandler {
    pool: PgPool,
}

impl NetBankHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn accounts(&self, user_id: Uuid) -> Result<Vec<AccountView>, AppError> {
        let accounts = accounts::list_for_user(&self.pool, user_id).await?;
        Ok(accounts.into_iter().map(AccountView::from).collect())
    }

    pub async fn cards(&self, user_id: Uuid) -> Result<Vec<CardView>, AppError> {
        let now = Utc::now();
        let cards = cards::list_for_user(&self.pool, user_id).await?;
        Ok(cards.into_iter().map(|card| CardView::new(card, now)).collect())
    }
}
