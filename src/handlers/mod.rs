//! Command Handlers module
//!
//! Handlers run one command as one unit of work: load and lock what the
//! engine needs, let the pure engine decide, then write the outcome.

mod card_handler;
mod commands;
mod netbank_handler;
mod transfer_handler;
mod withdrawal_handler;


pub use card_handler::CardHandler;
pub use commands::*;
pub use netbank_handler::{AccountView, CardView, NetBankHandler};
pub use transfer_handler::TransferHandler;
pub use withdrawal_handler::WithdrawalHandler;
