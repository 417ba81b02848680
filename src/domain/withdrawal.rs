//! Withdrawal pricing
//!
//! Pure computation of an ATM withdrawal: rolling 24-hour velocity cap,
//! flat commission, currency conversion and the balance check. Storage is
//! handled by the withdrawal handler; nothing here performs I/O.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{round_money, Account, Amount, Balance, Currency, DomainError, NewWithdrawal, RateSheet};

/// Flat 2% commission on the requested amount
pub const WITHDRAWAL_COMMISSION_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Rolling cap on withdrawals per account owner, in GEL
pub const DAILY_WITHDRAWAL_LIMIT_GEL: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Currency the velocity cap is expressed in
pub const VELOCITY_CURRENCY: Currency = Currency::Gel;

/// Start of the trailing 24-hour velocity window ending at `now`
pub fn velocity_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(24)
}

/// Requested withdrawal, already shape-validated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawalRequest {
    pub amount: Amount,
    pub currency: Currency,
}

impl WithdrawalRequest {
    pub fn new(amount: Amount, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Directed rate pairs the engine will read for this request
    pub fn required_pairs(
        &self,
        account_currency: Currency,
        history: &[(Currency, Decimal)],
    ) -> Vec<(Currency, Currency)> {
        let mut pairs: Vec<(Currency, Currency)> = history
            .iter()
            .map(|(currency, _)| (*currency, VELOCITY_CURRENCY))
            .chain([(self.currency, account_currency)])
            .filter(|(from, to)| from != to)
            .collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }
}

/// Sum per-currency withdrawal subtotals into GEL.
///
/// A subtotal whose currency has no `-> GEL` rate fails the whole
/// accumulation rather than counting as zero.
pub fn withdrawn_in_gel(
    history: &[(Currency, Decimal)],
    rates: &RateSheet,
) -> Result<Decimal, DomainError> {
    history.iter().try_fold(Decimal::ZERO, |total, (currency, sum)| {
        Ok(total + *sum * rates.rate(*currency, VELOCITY_CURRENCY)?)
    })
}

/// Reject when `withdrawn + requested >= limit`.
///
/// Only the history is converted to GEL; the requested amount is counted
/// at face value in whatever currency it was asked in.
pub fn check_velocity(withdrawn_gel: Decimal, request: &WithdrawalRequest) -> Result<(), DomainError> {
    let requested = request.amount.value();

    if withdrawn_gel + requested >= DAILY_WITHDRAWAL_LIMIT_GEL {
        return Err(DomainError::VelocityLimitExceeded {
            limit: DAILY_WITHDRAWAL_LIMIT_GEL,
            withdrawn: round_money(withdrawn_gel),
            requested,
        });
    }

    Ok(())
}

/// Priced withdrawal against one account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawalQuote {
    /// Requested amount, requested currency
    pub amount: Decimal,
    pub currency: Currency,
    /// Rate `requested -> account` (1 when equal)
    pub rate: Decimal,
    /// Requested amount in account currency
    pub converted_amount: Decimal,
    /// Commission in account currency
    pub commission: Decimal,
    pub account_currency: Currency,
    /// Total taken from the account
    pub debit: Decimal,
}

impl WithdrawalQuote {
    /// Price `request` against `account`. Fails with `InsufficientBalance`
    /// when the account cannot cover amount plus commission.
    pub fn price(
        request: &WithdrawalRequest,
        account: &Account,
        rates: &RateSheet,
    ) -> Result<Self, DomainError> {
        let commission_requested = request.amount.value() * WITHDRAWAL_COMMISSION_RATE;
        let rate = rates.rate(request.currency, account.currency)?;

        let converted_amount = request.amount.scale_by(rate);
        let commission = round_money(commission_requested * rate);
        let debit = converted_amount + commission;

        if !account.balance.covers(debit) {
            return Err(DomainError::insufficient_balance(
                debit,
                account.balance.value(),
            ));
        }

        Ok(Self {
            amount: request.amount.value(),
            currency: request.currency,
            rate,
            converted_amount,
            commission,
            account_currency: account.currency,
            debit,
        })
    }

    /// Balance after the debit
    pub fn apply(&self, balance: Balance) -> Result<Balance, DomainError> {
        balance
            .debit(self.debit)
            .map_err(|_| DomainError::insufficient_balance(self.debit, balance.value()))
    }

    /// Ledger entry for this withdrawal
    pub fn record(&self, user_id: Uuid, now: DateTime<Utc>) -> NewWithdrawal {
        NewWithdrawal {
            user_id,
            amount: self.amount,
            currency: self.currency,
            commission: self.commission,
            commission_currency: self.account_currency,
            created_at: now,
        }
    }
}

/// Full withdrawal decision: velocity first, then pricing and balance.
pub fn plan_withdrawal(
    request: &WithdrawalRequest,
    account: &Account,
    history: &[(Currency, Decimal)],
    rates: &RateSheet,
) -> Result<WithdrawalQuote, DomainError> {
    let withdrawn = withdrawn_in_gel(history, rates)?;
    check_velocity(withdrawn, request)?;
    WithdrawalQuote::price(request, account, rates)
}
