//! Transfer Handler
//!
//! Handles net-bank transfers between IBANs. Both accounts are locked in
//! one transaction; debit, credit and the ledger entry commit together.

use chrono::Utc;
use sqlx::PgPool;

use crate::domain::transfer::required_pairs;
use crate::domain::{plan_transfer, DomainError, OperationContext};
use crate::error::AppError;
use crate::repository::{self, accounts, ledger, rates};

use super::{TransferCommand, TransferResult};

// =========================================================================
// TransferHandler
// =========================================================================

/// Handler for net-bank transfers
pub struct TransferHandler {
    pool: PgPool,
}

impl TransferHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Execute the transfer command
    pub async fn execute(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> Result<TransferResult, AppError> {
        // Authorization check
        match context.request_user_id {
            Some(user_id) if user_id == command.sender_user_id => {}
            Some(_) => return Err(DomainError::OwnershipViolation.into()),
            None => return Err(AppError::MissingHeader("X-Request-User-Id".to_string())),
        }

        if command.sender_iban == command.receiver_iban {
            return Err(DomainError::SameAccountTransfer.into());
        }

        match self.transfer(&command).await {
            Ok(result) => {
                tracing::info!(
                    sender = %command.sender_iban,
                    receiver = %command.receiver_iban,
                    amount = %command.amount,
                    currency = %command.currency,
                    debit = %result.debited,
                    credit = %result.credited,
                    kind = ?result.kind,
                    correlation_id = ?context.correlation_id,
                    "Transfer completed"
                );
                Ok(result)
            }
            Err(AppError::Domain(err)) if err.is_client_error() => {
                tracing::info!(
                    sender = %command.sender_iban,
                    receiver = %command.receiver_iban,
                    amount = %command.amount,
                    reason = %err,
                    correlation_id = ?context.correlation_id,
                    "Transfer rejected"
                );
                Err(AppError::Domain(err))
            }
            Err(err) => {
                tracing::error!(sender = %command.sender_iban, error = %err, "Transfer failed");
                Err(err)
            }
        }
    }

    async fn transfer(&self, command: &TransferCommand) -> Result<TransferResult, AppError> {
        let now = Utc::now();
        let mut tx = repository::begin(&self.pool).await?;

        let (sender, receiver) =
            accounts::lock_pair(&mut tx, &command.sender_iban, &command.receiver_iban).await?;

        let sender = sender
            .ok_or_else(|| DomainError::AccountNotFound(command.sender_iban.to_string()))?;
        if sender.user_id != command.sender_user_id {
            return Err(DomainError::OwnershipViolation.into());
        }
        let receiver = receiver
            .ok_or_else(|| DomainError::AccountNotFound(command.receiver_iban.to_string()))?;

        let pairs = required_pairs(command.currency, sender.currency, receiver.currency);
        let sheet = rates::load_sheet(&mut tx, &pairs).await?;

        let quote = plan_transfer(
            command.sender_user_id,
            &sender,
            &receiver,
            command.amount,
            command.currency,
            &sheet,
        )?;
        let (sender_balance, receiver_balance) = quote.apply(sender.balance, receiver.balance)?;

        accounts::update_balance(&mut tx, sender.id, sender_balance).await?;
        accounts::update_balance(&mut tx, receiver.id, receiver_balance).await?;
        let record =
            ledger::insert_transaction(&mut tx, &quote.record(&sender, &receiver, now)).await?;

        repository::commit(tx).await?;

        Ok(TransferResult {
            transaction_id: record.id,
            kind: quote.kind,
            amount: quote.amount,
            currency: quote.currency,
            commission: quote.commission,
            debited: quote.sender_debit,
            credited: quote.receiver_credit,
            created_at: record.created_at,
        })
    }
}
