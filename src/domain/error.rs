//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::Currency;

/// Errors raised by the withdrawal and transfer engines.
///
/// Every variant except `PersistenceFailure` is raised before any mutation
/// is applied, so a rejected operation leaves no partial state behind.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// No card with this number
    #[error("Card not found")]
    CardNotFound,

    /// Card expiration date is not in the future
    #[error("Card is expired")]
    CardExpired,

    /// Account not found (by IBAN or card association)
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Sender account does not belong to the authenticated user
    #[error("The sender account must belong to the sender user")]
    OwnershipViolation,

    /// Sender and receiver are the same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// No stored rate for this directed pair
    #[error("Exchange rate not found: {from}->{to}")]
    ExchangeRateNotFound { from: Currency, to: Currency },

    /// Rolling 24-hour withdrawal cap reached
    #[error("The amount withdrawn in 24 hours should not exceed {limit} GEL (already {withdrawn}, requested {requested})")]
    VelocityLimitExceeded {
        limit: Decimal,
        withdrawn: Decimal,
        requested: Decimal,
    },

    /// Insufficient balance for debit operation
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    /// Amount outside the valid range
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Stored rate is not positive; bad data, not a caller mistake
    #[error("Corrupt exchange rate {rate} for {from}->{to}")]
    CorruptExchangeRate {
        from: Currency,
        to: Currency,
        rate: Decimal,
    },

    /// Storage unit of work failed; nothing was committed
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl DomainError {
    /// Create an insufficient balance error
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Business rule rejected the operation (never retried)
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            Self::CardExpired
                | Self::OwnershipViolation
                | Self::SameAccountTransfer
                | Self::VelocityLimitExceeded { .. }
                | Self::InsufficientBalance { .. }
                | Self::InvalidAmount(_)
        )
    }

    /// A referenced card, account or rate does not exist
    pub fn is_missing_reference(&self) -> bool {
        matches!(
            self,
            Self::CardNotFound | Self::AccountNotFound(_) | Self::ExchangeRateNotFound { .. }
        )
    }

    /// Check if this is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        self.is_rule_violation() || self.is_missing_reference()
    }

    /// Only storage failures may be retried by the caller, since nothing
    /// was committed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_))
    }
}

impl From<super::AmountError> for DomainError {
    fn from(err: super::AmountError) -> Self {
        DomainError::InvalidAmount(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_balance_error() {
        let err = DomainError::insufficient_balance(dec!(102), dec!(50));

        assert!(err.is_client_error());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("102"));
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_missing_reference_errors() {
        let err = DomainError::ExchangeRateNotFound {
            from: Currency::Usd,
            to: Currency::Gel,
        };
        assert!(err.is_missing_reference());
        assert!(!err.is_rule_violation());
        assert_eq!(err.to_string(), "Exchange rate not found: USD->GEL");
    }

    #[test]
    fn test_corrupt_rate_is_a_server_fault() {
        let err = DomainError::CorruptExchangeRate {
            from: Currency::Eur,
            to: Currency::Gel,
            rate: Decimal::ZERO,
        };
        assert!(!err.is_client_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_persistence_failure_is_retryable() {
        let err = DomainError::PersistenceFailure("connection reset".into());
        assert!(err.is_retryable());
        assert!(!err.is_client_error());
    }
}
