//! Domain module
//!
//! Core domain types and business logic.

pub mod account;
pub mod amount;
pub mod clock;
pub mod customer;
pub mod error;
pub mod ids;
pub mod transaction;

pub use account::{Account, AccountType, NewAccount, Status};
pub use amount::{Amount, AmountError, Balance, MAX_AMOUNT};
pub use clock::{Clock, FixedClock, SystemClock};
pub use customer::{Customer, StatusFilter};
pub use error::DomainError;
pub use ids::{AccountId, CustomerId, InvalidId, TransactionId};
pub use transaction::{PendingTransaction, Transaction, TransactionType};
