//! Loan servicing trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::ServiceError;

/// An active loan owned by the servicing system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub mortgage_id: Uuid,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub term_years: u32,
    pub monthly_payment: f64,
    pub outstanding_balance: f64,
    /// `active`, `paid_off`, or `defaulted`.
    pub status: String,
}

/// Fields required to board a loan into servicing.
#[derive(Debug, Clone)]
pub struct LoanRequest {
    pub customer_id: Uuid,
    pub mortgage_id: Uuid,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub term_years: u32,
}

/// Client for the loan servicing system.
#[async_trait]
pub trait LoanService: Send + Sync {
    /// Boards a loan and returns the stored record.
    async fn create(&self, request: LoanRequest) -> Result<Loan, ServiceError>;

    /// Deletes a previously boarded loan.
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
}

/// Standard amortization payment for a fixed-rate loan.
fn monthly_payment(amount: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    let periods = f64::from(term_years * 12);
    if monthly_rate == 0.0 {
        return amount / periods;
    }
    amount * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-periods))
}

#[derive(Debug, Default)]
struct InMemoryLoanState {
    loans: HashMap<Uuid, Loan>,
    fail_on_create: bool,
}

/// In-memory loan servicing for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoanService {
    state: Arc<RwLock<InMemoryLoanState>>,
}

impl InMemoryLoanService {
    /// Creates a new in-memory loan service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail on create calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Returns the number of boarded loans.
    pub fn loan_count(&self) -> usize {
        self.state.read().unwrap().loans.len()
    }

    /// Returns true if a loan exists with the given ID.
    pub fn has_loan(&self, id: Uuid) -> bool {
        self.state.read().unwrap().loans.contains_key(&id)
    }
}

#[async_trait]
impl LoanService for InMemoryLoanService {
    async fn create(&self, request: LoanRequest) -> Result<Loan, ServiceError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(ServiceError::Servicing(
                "servicing system rejected the loan".to_string(),
            ));
        }

        let loan = Loan {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            mortgage_id: request.mortgage_id,
            loan_amount: request.loan_amount,
            interest_rate: request.interest_rate,
            term_years: request.term_years,
            monthly_payment: monthly_payment(
                request.loan_amount,
                request.interest_rate,
                request.term_years,
            ),
            outstanding_balance: request.loan_amount,
            status: "active".to_string(),
        };
        state.loans.insert(loan.id, loan.clone());

        Ok(loan)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.loans.remove(&id);
        Ok(())
    }
}
