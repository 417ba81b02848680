//! Transfer pricing
//!
//! Decides how much leaves the sender and how much reaches the receiver
//! for a net-bank transfer. Same-owner transfers are free; cross-owner
//! transfers carry `amount * 1% + 0.5` in transaction currency, charged to
//! the sender only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{round_money, Account, Amount, Balance, Currency, DomainError, NewTransaction, RateSheet};

/// Variable part of the cross-owner commission
pub const TRANSFER_COMMISSION_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Flat part of the cross-owner commission, in transaction currency
pub const TRANSFER_COMMISSION_FLAT: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Both accounts belong to the same user
    Internal,
    /// Accounts belong to different users
    External,
}

/// Commission charged on a cross-owner transfer of `amount`
pub fn transfer_commission(amount: Amount) -> Decimal {
    round_money(amount.value() * TRANSFER_COMMISSION_RATE + TRANSFER_COMMISSION_FLAT)
}

/// Directed rate pairs a transfer between these currencies reads
pub fn required_pairs(
    currency: Currency,
    sender: Currency,
    receiver: Currency,
) -> Vec<(Currency, Currency)> {
    let mut pairs: Vec<_> = [(currency, sender), (currency, receiver)]
        .into_iter()
        .filter(|(from, to)| from != to)
        .collect();
    pairs.dedup();
    pairs
}

/// Priced transfer between two locked accounts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferQuote {
    pub kind: TransferKind,
    /// Original amount in transaction currency
    pub amount: Decimal,
    pub currency: Currency,
    /// Commission in transaction currency (zero for internal transfers)
    pub commission: Decimal,
    /// Taken from the sender, in sender currency
    pub sender_debit: Decimal,
    /// Given to the receiver, in receiver currency
    pub receiver_credit: Decimal,
}

impl TransferQuote {
    /// Price a transfer of `amount` in `currency` from `sender` to `receiver`.
    ///
    /// Ownership of the sender account is checked by the caller; this only
    /// compares the two owners to pick the commission branch.
    pub fn price(
        sender: &Account,
        receiver: &Account,
        amount: Amount,
        currency: Currency,
        rates: &RateSheet,
    ) -> Result<Self, DomainError> {
        if sender.id == receiver.id || sender.iban == receiver.iban {
            return Err(DomainError::SameAccountTransfer);
        }

        let (kind, commission) = if sender.user_id == receiver.user_id {
            (TransferKind::Internal, Decimal::ZERO)
        } else {
            (TransferKind::External, transfer_commission(amount))
        };

        let to_sender = rates.rate(currency, sender.currency)?;
        let to_receiver = rates.rate(currency, receiver.currency)?;

        let sender_debit = round_money((amount.value() + commission) * to_sender);
        let receiver_credit = amount.scale_by(to_receiver);

        if !sender.balance.covers(sender_debit) {
            return Err(DomainError::insufficient_balance(
                sender_debit,
                sender.balance.value(),
            ));
        }

        Ok(Self {
            kind,
            amount: amount.value(),
            currency,
            commission,
            sender_debit,
            receiver_credit,
        })
    }

    /// New `(sender, receiver)` balances
    pub fn apply(&self, sender: Balance, receiver: Balance) -> Result<(Balance, Balance), DomainError> {
        let sender = sender
            .debit(self.sender_debit)
            .map_err(|_| DomainError::insufficient_balance(self.sender_debit, sender.value()))?;
        let receiver = receiver.credit(self.receiver_credit)?;
        Ok((sender, receiver))
    }

    /// Ledger entry for this transfer
    pub fn record(
        &self,
        sender: &Account,
        receiver: &Account,
        now: DateTime<Utc>,
    ) -> NewTransaction {
        NewTransaction {
            sender_user_id: sender.user_id,
            sender_iban: sender.iban.clone(),
            receiver_iban: receiver.iban.clone(),
            amount: self.amount,
            currency: self.currency,
            commission: self.commission,
            created_at: now,
        }
    }
}

/// Full transfer decision, including the ownership check on the sender.
pub fn plan_transfer(
    requester: Uuid,
    sender: &Account,
    receiver: &Account,
    amount: Amount,
    currency: Currency,
    rates: &RateSheet,
) -> Result<TransferQuote, DomainError> {
    if sender.user_id != requester {
        return Err(DomainError::OwnershipViolation);
    }
    TransferQuote::price(sender, receiver, amount, currency, rates)
}
