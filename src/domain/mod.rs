//! Domain module
//!
//! Core domain types and the pure monetary engines.

pub mod amount;
pub mod context;
pub mod currency;
pub mod error;
pub mod identifiers;
pub mod records;
pub mod transfer;
pub mod withdrawal;

pub use amount::{round_money, Amount, AmountError, Balance, MONEY_SCALE};
pub use context::{OperationContext, Role};
pub use currency::{Currency, ExchangeRate, RateSheet, UnknownCurrency};
pub use error::DomainError;
pub use identifiers::{CardNumber, Iban, IdentifierError, Pin, IBAN_PREFIX};
pub use records::{Account, Card, NewTransaction, NewWithdrawal, TransactionRecord, WithdrawalRecord};
pub use transfer::{plan_transfer, TransferKind, TransferQuote};
pub use withdrawal::{plan_withdrawal, WithdrawalQuote, WithdrawalRequest};
