//! Mortgage application service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::ServiceError;

/// A mortgage application owned by the applications service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageApplication {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub loan_amount: f64,
    pub property_value: f64,
    pub interest_rate: f64,
    pub term_years: u32,
    /// `pending`, `approved`, or `rejected`.
    pub status: String,
}

/// Fields required to open a mortgage application.
#[derive(Debug, Clone)]
pub struct ApplicationRequest {
    pub customer_id: Uuid,
    pub loan_amount: f64,
    pub property_value: f64,
    pub interest_rate: f64,
    pub term_years: u32,
}

/// Client for the mortgage applications service.
#[async_trait]
pub trait ApplicationService: Send + Sync {
    /// Opens an application and returns the stored record.
    async fn create(&self, request: ApplicationRequest)
    -> Result<MortgageApplication, ServiceError>;

    /// Deletes a previously opened application.
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryApplicationState {
    applications: HashMap<Uuid, MortgageApplication>,
    fail_on_create: bool,
}

/// In-memory application service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryApplicationService {
    state: Arc<RwLock<InMemoryApplicationState>>,
}

impl InMemoryApplicationService {
    /// Creates a new in-memory application service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail on create calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Returns the number of open applications.
    pub fn application_count(&self) -> usize {
        self.state.read().unwrap().applications.len()
    }

    /// Returns true if an application exists with the given ID.
    pub fn has_application(&self, id: Uuid) -> bool {
        self.state.read().unwrap().applications.contains_key(&id)
    }
}

#[async_trait]
impl ApplicationService for InMemoryApplicationService {
    async fn create(
        &self,
        request: ApplicationRequest,
    ) -> Result<MortgageApplication, ServiceError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(ServiceError::Applications(
                "loan-to-value ratio too high".to_string(),
            ));
        }

        let application = MortgageApplication {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            loan_amount: request.loan_amount,
            property_value: request.property_value,
            interest_rate: request.interest_rate,
            term_years: request.term_years,
            status: "pending".to_string(),
        };
        state.applications.insert(application.id, application.clone());

        Ok(application)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.applications.remove(&id);
        Ok(())
    }
}
