//! Customer service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::ServiceError;

/// A customer record owned by the customers service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Client for the customers service.
#[async_trait]
pub trait CustomerService: Send + Sync {
    /// Creates a customer and returns the stored record.
    async fn create(&self, name: &str, email: &str) -> Result<Customer, ServiceError>;

    /// Deletes a previously created customer.
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCustomerState {
    customers: HashMap<Uuid, Customer>,
    fail_on_create: bool,
    fail_on_delete: bool,
}

/// In-memory customer service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerService {
    state: Arc<RwLock<InMemoryCustomerState>>,
}

impl InMemoryCustomerService {
    /// Creates a new in-memory customer service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail on create calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the service to fail on delete calls.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.state.write().unwrap().fail_on_delete = fail;
    }

    /// Returns the number of stored customers.
    pub fn customer_count(&self) -> usize {
        self.state.read().unwrap().customers.len()
    }

    /// Returns true if a customer exists with the given ID.
    pub fn has_customer(&self, id: Uuid) -> bool {
        self.state.read().unwrap().customers.contains_key(&id)
    }
}

#[async_trait]
impl CustomerService for InMemoryCustomerService {
    async fn create(&self, name: &str, email: &str) -> Result<Customer, ServiceError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(ServiceError::Customers(
                "email already registered".to_string(),
            ));
        }

        let customer = Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
        };
        state.customers.insert(customer.id, customer.clone());

        Ok(customer)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_delete {
            return Err(ServiceError::Customers("service unavailable".to_string()));
        }

        state.customers.remove(&id);
        Ok(())
    }
}
