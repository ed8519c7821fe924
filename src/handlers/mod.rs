//! Command Handlers module
//!
//! Handlers orchestrate business operations on top of the repositories.
//! They return `DomainError`; the HTTP layer decides status codes.

mod account_handler;
mod commands;
mod customer_handler;
mod transaction_handler;


pub use account_handler::AccountHandler;
pub use commands::*;
pub use customer_handler::CustomerHandler;
pub use transaction_handler::TransactionHandler;
