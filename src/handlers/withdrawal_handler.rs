//! Withdrawal Handler
//!
//! Runs an ATM withdrawal as one unit of work: card and account checks,
//! velocity cap, pricing, balance update and ledger insert all share a
//! single transaction. Every account of the card's owner is locked before
//! the 24-hour history is read, so the cap holds across cards.

use chrono::Utc;
use sqlx::PgPool;

use crate::domain::withdrawal::velocity_window_start;
use crate::domain::{plan_withdrawal, DomainError, OperationContext, WithdrawalRequest};
use crate::error::AppError;
use crate::repository::{self, accounts, cards, ledger, rates};

use super::{WithdrawCommand, WithdrawResult};

// =========================================================================
// WithdrawalHandler
// =========================================================================

pub struct WithdrawalHandler {
    pool: PgPool,
}

impl WithdrawalHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Execute the withdrawal command
    pub async fn execute(
        &self,
        command: WithdrawCommand,
        context: &OperationContext,
    ) -> Result<WithdrawResult, AppError> {
        let card = command.card_number.masked();

        match self.withdraw(&command).await {
            Ok(result) => {
                tracing::info!(
                    card = %card,
                    amount = %command.amount,
                    currency = %command.currency,
                    debit = %result.debited,
                    correlation_id = ?context.correlation_id,
                    "Withdrawal completed"
                );
                Ok(result)
            }
            Err(AppError::Domain(err)) if err.is_client_error() => {
                tracing::info!(
                    card = %card,
                    amount = %command.amount,
                    currency = %command.currency,
                    reason = %err,
                    correlation_id = ?context.correlation_id,
                    "Withdrawal rejected"
                );
                Err(AppError::Domain(err))
            }
            Err(err) => {
                tracing::error!(card = %card, error = %err, "Withdrawal failed");
                Err(err)
            }
        }
    }

    async fn withdraw(&self, command: &WithdrawCommand) -> Result<WithdrawResult, AppError> {
        let now = Utc::now();
        let mut tx = repository::begin(&self.pool).await?;

        // Preconditions, in order: card, expiry, account
        let card = cards::find_by_number(&mut *tx, &command.card_number)
            .await?
            .ok_or(DomainError::CardNotFound)?;

        if card.is_expired(now) {
            return Err(DomainError::CardExpired.into());
        }

        let missing = || DomainError::AccountNotFound(card.account_id.to_string());

        let owner = accounts::find_by_id(&mut *tx, card.account_id)
            .await?
            .ok_or_else(missing)?
            .user_id;

        // Serializes withdrawals per owner; the locked rows are the fresh ones
        let account = accounts::lock_for_user(&mut tx, owner)
            .await?
            .into_iter()
            .find(|a| a.id == card.account_id)
            .ok_or_else(missing)?;

        let history =
            ledger::withdrawal_totals(&mut tx, account.user_id, velocity_window_start(now), now)
                .await?;

        let request = WithdrawalRequest::new(command.amount, command.currency);
        let sheet =
            rates::load_sheet(&mut tx, &request.required_pairs(account.currency, &history)).await?;

        // Everything is decided before the first write
        let quote = plan_withdrawal(&request, &account, &history, &sheet)?;
        let balance = quote.apply(account.balance)?;

        accounts::update_balance(&mut tx, account.id, balance).await?;
        let record = ledger::insert_withdrawal(&mut tx, &quote.record(account.user_id, now)).await?;

        repository::commit(tx).await?;

        Ok(WithdrawResult {
            withdrawal_id: record.id,
            amount: quote.amount,
            currency: quote.currency,
            commission: quote.commission,
            debited: quote.debit,
            account_currency: quote.account_currency,
            balance: balance.value(),
            created_at: record.created_at,
        })
    }
}
