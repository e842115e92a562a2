//! Downstream service adapters consumed by saga steps.
//!
//! Each remote service is represented by a client trait exposing a pair of
//! inverse operations. The in-memory implementations stand in for the real
//! HTTP clients in tests and demos, with injectable failure switches.

pub mod applications;
pub mod customers;
pub mod servicing;

pub use applications::{
    ApplicationRequest, ApplicationService, InMemoryApplicationService, MortgageApplication,
};
pub use customers::{Customer, CustomerService, InMemoryCustomerService};
pub use servicing::{InMemoryLoanService, Loan, LoanRequest, LoanService};

use thiserror::Error;

/// Errors returned by the downstream service clients.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Customer service error.
    #[error("Customer service error: {0}")]
    Customers(String),

    /// Mortgage application service error.
    #[error("Application service error: {0}")]
    Applications(String),

    /// Loan servicing error.
    #[error("Loan servicing error: {0}")]
    Servicing(String),
}
