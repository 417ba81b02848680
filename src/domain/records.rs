//! Ledger entities
//!
//! Accounts and cards as the engines see them, plus the append-only
//! withdrawal and transaction records they write.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{Balance, CardNumber, Currency, Iban};

/// Bank account holding a single-currency balance
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub iban: Iban,
    pub balance: Balance,
    pub currency: Currency,
}

/// Card issued against an account. The PIN is never loaded.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Card {
    pub id: Uuid,
    pub card_number: CardNumber,
    pub expires_at: DateTime<Utc>,
    pub account_id: Uuid,
}

impl Card {
    /// A card is usable only while its expiration lies strictly in the future
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// ATM withdrawal ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WithdrawalRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Requested (pre-conversion) amount
    pub amount: Decimal,
    /// Requested currency
    pub currency: Currency,
    pub commission: Decimal,
    /// Currency `commission` is expressed in (the account currency)
    pub commission_currency: Currency,
    pub created_at: DateTime<Utc>,
}

/// Withdrawal entry about to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewWithdrawal {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub currency: Currency,
    pub commission: Decimal,
    pub commission_currency: Currency,
    pub created_at: DateTime<Utc>,
}

/// Net-bank transfer ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub sender_user_id: Uuid,
    pub sender_iban: Iban,
    pub receiver_iban: Iban,
    /// Original transaction amount
    pub amount: Decimal,
    /// Transaction currency; `commission` is expressed in it as well
    pub currency: Currency,
    pub commission: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Transaction entry about to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub sender_user_id: Uuid,
    pub sender_iban: Iban,
    pub receiver_iban: Iban,
    pub amount: Decimal,
    pub currency: Currency,
    pub commission: Decimal,
    pub created_at: DateTime<Utc>,
}
