//! Account and card identifiers
//!
//! Shape rules mirror what the request validation layer enforces; values
//! read back from storage are trusted as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed bank prefix of every IBAN issued by this bank
pub const IBAN_PREFIX: &str = "GE00TT";

const IBAN_LEN: usize = 22;
const CARD_NUMBER_LEN: usize = 16;
const PIN_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("IBAN must follow the {IBAN_PREFIX} + 16 digits pattern")]
    InvalidIban,

    #[error("Card number must contain 16 digits")]
    InvalidCardNumber,

    #[error("PIN must contain 4 digits")]
    InvalidPin,
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Account IBAN: `GE00TT` followed by 16 digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct Iban(String);

impl Iban {
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let value = value.trim().to_ascii_uppercase();
        if value.len() != IBAN_LEN || !value.starts_with(IBAN_PREFIX) {
            return Err(IdentifierError::InvalidIban);
        }
        if !all_digits(&value[IBAN_PREFIX.len()..]) {
            return Err(IdentifierError::InvalidIban);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 16-digit card number. Display and Debug both print it masked.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct CardNumber(String);

impl CardNumber {
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let value = value.trim();
        if value.len() != CARD_NUMBER_LEN || !all_digits(value) {
            return Err(IdentifierError::InvalidCardNumber);
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last four digits, for logs
    pub fn masked(&self) -> String {
        let tail = self.0.get(self.0.len().saturating_sub(4)..).unwrap_or_default();
        format!("************{}", tail)
    }
}

/// 4-digit PIN. Never serialized back out.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Pin(String);

impl Pin {
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if value.len() != PIN_LEN || !all_digits(value) {
            return Err(IdentifierError::InvalidPin);
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

macro_rules! string_conversions {
    ($ty:ident) => {
        impl FromStr for $ty {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::parse(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                $ty::parse(&value)
            }
        }
    };
}

string_conversions!(Iban);
string_conversions!(CardNumber);
string_conversions!(Pin);

impl From<Iban> for String {
    fn from(iban: Iban) -> Self {
        iban.0
    }
}

impl From<CardNumber> for String {
    fn from(card: CardNumber) -> Self {
        card.0
    }
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardNumber({})", self.masked())
    }
}
