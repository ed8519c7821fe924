//! Customer Repository

use std::sync::Arc;

use crate::domain::{Customer, CustomerId, DomainError, StatusFilter};
use crate::store::CustomerStore;

/// Read-only repository for customers
#[derive(Clone)]
pub struct CustomerRepository {
    store: Arc<dyn CustomerStore>,
}

impl CustomerRepository {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    /// Customers matching a raw status filter: "" for all, "active" or "inactive"
    pub async fn find_all(&self, status: &str) -> Result<Vec<Customer>, DomainError> {
        let filter =
            StatusFilter::parse(status).ok_or_else(|| DomainError::not_found("Invalid status"))?;

        self.store.find_customers(filter).await.map_err(|e| {
            tracing::error!(status, error = %e, "Error while querying customers table");
            DomainError::unexpected()
        })
    }

    pub async fn find_by_id(&self, customer_id: CustomerId) -> Result<Customer, DomainError> {
        self.store
            .find_customer(customer_id)
            .await
            .map_err(|e| {
                tracing::error!(%customer_id, error = %e, "Error while scanning customer");
                DomainError::unexpected()
            })?
            .ok_or_else(|| DomainError::not_found("Customer not found"))
    }
}
