//! Repository module
//!
//! Domain-facing access to the stores. Storage failures are logged here with
//! their context and surface to callers only as `DomainError::Unexpected`.

mod account;
mod customer;

pub use account::AccountRepository;
pub use customer::CustomerRepository;
