//! Customer Handler

use std::sync::Arc;

use crate::domain::{CustomerId, DomainError};
use crate::repository::CustomerRepository;
use crate::store::CustomerStore;

use super::CustomerResponse;

/// Read-only customer queries
pub struct CustomerHandler {
    customers: CustomerRepository,
}

impl CustomerHandler {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self {
            customers: CustomerRepository::new(store),
        }
    }

    /// `status` is `""` (everyone), `"active"` or `"inactive"`
    pub async fn get_all_customers(
        &self,
        status: &str,
    ) -> Result<Vec<CustomerResponse>, DomainError> {
        let customers = self.customers.find_all(status).await?;
        Ok(customers.into_iter().map(CustomerResponse::from).collect())
    }

    pub async fn get_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<CustomerResponse, DomainError> {
        self.customers
            .find_by_id(customer_id)
            .await
            .map(CustomerResponse::from)
    }
}
