//! Identifier types
//!
//! Store-assigned numeric identifiers. They travel as strings on the wire
//! (`"account_id": "1977"`) and as `BIGINT` in the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when an identifier is not a positive number
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier must be a positive number: {0:?}")]
pub struct InvalidId(pub String);

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(InvalidId(s.to_string()));
                }
                trimmed
                    .parse::<i64>()
                    .ok()
                    .filter(|v| *v > 0)
                    .map(Self)
                    .ok_or_else(|| InvalidId(s.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }
    };
}

numeric_id!(
    /// Account identifier, assigned by the store on creation
    AccountId
);

numeric_id!(
    /// Customer identifier
    CustomerId
);

numeric_id!(
    /// Ledger entry identifier, assigned by the store at append time
    TransactionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_id() {
        let id: AccountId = "1977".parse().unwrap();
        assert_eq!(id.value(), 1977);
        assert_eq!(id.to_string(), "1977");
    }

    #[test]
    fn test_reject_non_numeric() {
        assert!("".parse::<AccountId>().is_err());
        assert!("abc".parse::<CustomerId>().is_err());
        assert!("-5".parse::<AccountId>().is_err());
        assert!("0".parse::<TransactionId>().is_err());
        assert!("12a".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_serialized_as_string() {
        let json = serde_json::to_string(&TransactionId::new(42)).unwrap();
        assert_eq!(json, r#""42""#);

        let id: CustomerId = serde_json::from_str(r#""2""#).unwrap();
        assert_eq!(id, CustomerId::new(2));
    }
}
