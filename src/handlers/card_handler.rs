//! Card Handler
//!
//! Balance query and PIN change for an ATM session. Neither touches the
//! ledger.

use chrono::Utc;
use sqlx::PgPool;

use crate::domain::{CardNumber, DomainError, OperationContext};
use crate::error::AppError;
use crate::repository::{accounts, cards};

use super::{BalanceResult, ChangePinCommand};

pub struct CardHandler {
    pool: PgPool,
}

impl CardHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Balance of the account behind a non-expired card.
    /// Expired cards are reported as not found.
    pub async fn balance(
        &self,
        card_number: &CardNumber,
        context: &OperationContext,
    ) -> Result<BalanceResult, AppError> {
        let card = cards::find_by_number(&self.pool, card_number)
            .await?
            .filter(|card| !card.is_expired(Utc::now()))
            .ok_or(DomainError::CardNotFound)?;

        let account = accounts::find_by_id(&self.pool, card.account_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(card.account_id.to_string()))?;

        tracing::debug!(
            card = %card_number,
            correlation_id = ?context.correlation_id,
            "Balance queried"
        );

        Ok(BalanceResult {
            iban: account.iban,
            balance: account.balance.value(),
            currency: account.currency,
        })
    }

    /// Replace the PIN of a non-expired card
    pub async fn change_pin(
        &self,
        command: ChangePinCommand,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        let updated =
            cards::update_pin(&self.pool, &command.card_number, &command.new_pin, Utc::now())
                .await?;

        if !updated {
            tracing::info!(card = %command.card_number, "PIN change rejected: card not found or expired");
            return Err(DomainError::CardNotFound.into());
        }

        tracing::info!(
            card = %command.card_number,
            correlation_id = ?context.correlation_id,
            "PIN changed"
        );

        Ok(())
    }
}
