//! Command definitions
//!
//! Commands arrive already shape-validated: every field is a parsed domain
//! type, so the handlers only deal with business rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Amount, CardNumber, Currency, Iban, Pin, TransferKind};

// =========================================================================
// Withdraw
// =========================================================================

/// ATM withdrawal against the account behind a card
#[derive(Debug, Clone)]
pub struct WithdrawCommand {
    pub card_number: CardNumber,
    pub amount: Amount,
    pub currency: Currency,
}

impl WithdrawCommand {
    pub fn new(card_number: CardNumber, amount: Amount, currency: Currency) -> Self {
        Self {
            card_number,
            amount,
            currency,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawResult {
    pub withdrawal_id: Uuid,
    /// Requested amount and currency
    pub amount: Decimal,
    pub currency: Currency,
    /// Commission in account currency
    pub commission: Decimal,
    /// Total taken from the account, in account currency
    pub debited: Decimal,
    pub account_currency: Currency,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

// =========================================================================
// Transfer
// =========================================================================

/// Net-bank transfer between two IBANs
#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub sender_iban: Iban,
    pub receiver_iban: Iban,
    pub amount: Amount,
    pub currency: Currency,
    /// Authenticated user; must own the sender account
    pub sender_user_id: Uuid,
}

impl TransferCommand {
    pub fn new(
        sender_iban: Iban,
        receiver_iban: Iban,
        amount: Amount,
        currency: Currency,
        sender_user_id: Uuid,
    ) -> Self {
        Self {
            sender_iban,
            receiver_iban,
            amount,
            currency,
            sender_user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub transaction_id: Uuid,
    pub kind: TransferKind,
    pub amount: Decimal,
    pub currency: Currency,
    /// Commission in transaction currency
    pub commission: Decimal,
    /// Sender side, in sender currency
    pub debited: Decimal,
    /// Receiver side, in receiver currency
    pub credited: Decimal,
    pub created_at: DateTime<Utc>,
}

// =========================================================================
// Card operations
// =========================================================================

#[derive(Debug, Clone)]
pub struct ChangePinCommand {
    pub card_number: CardNumber,
    pub new_pin: Pin,
}

impl ChangePinCommand {
    pub fn new(card_number: CardNumber, new_pin: Pin) -> Self {
        Self {
            card_number,
            new_pin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResult {
    pub iban: Iban,
    pub balance: Decimal,
    pub currency: Currency,
}
