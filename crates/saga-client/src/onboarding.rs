//! Customer onboarding saga: customer → mortgage application → loan.
//!
//! Wires the three downstream service adapters into a saga. Each forward
//! step records the identifier it created in the payload before returning,
//! so the matching compensation always knows what to undo.

use std::sync::Arc;

use saga::{ContinueAllStrategy, RetryConfig, Saga, SagaError};
use saga_store::{SagaId, SagaStateStore};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::services::{
    ApplicationRequest, ApplicationService, CustomerService, LoanRequest, LoanService,
};

/// Step name: Create the customer record.
pub const STEP_CREATE_CUSTOMER: &str = "CreateCustomer";

/// Step name: Open the mortgage application.
pub const STEP_CREATE_APPLICATION: &str = "CreateApplication";

/// Step name: Board the loan into servicing.
pub const STEP_CREATE_LOAN: &str = "CreateLoan";

/// Shared data context for the onboarding saga.
///
/// Input fields are set by the caller; the optional identifiers are
/// populated by the steps as they execute and drive the compensations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingData {
    pub name: String,
    pub email: String,
    pub loan_amount: f64,
    pub property_value: f64,
    pub interest_rate: f64,
    pub term_years: u32,

    /// Set by the CreateCustomer step.
    pub customer_id: Option<Uuid>,
    /// Set by the CreateApplication step.
    pub application_id: Option<Uuid>,
    /// Set by the CreateLoan step.
    pub loan_id: Option<Uuid>,
}

impl OnboardingData {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        loan_amount: f64,
        property_value: f64,
        interest_rate: f64,
        term_years: u32,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            loan_amount,
            property_value,
            interest_rate,
            term_years,
            customer_id: None,
            application_id: None,
            loan_id: None,
        }
    }
}

/// Builds and runs customer onboarding sagas over the injected adapters.
pub struct OnboardingSaga {
    store: Arc<dyn SagaStateStore>,
    customers: Arc<dyn CustomerService>,
    applications: Arc<dyn ApplicationService>,
    servicing: Arc<dyn LoanService>,
    retry_config: RetryConfig,
}

impl OnboardingSaga {
    pub fn new(
        store: Arc<dyn SagaStateStore>,
        customers: Arc<dyn CustomerService>,
        applications: Arc<dyn ApplicationService>,
        servicing: Arc<dyn LoanService>,
    ) -> Self {
        Self {
            store,
            customers,
            applications,
            servicing,
            retry_config: RetryConfig::default(),
        }
    }

    /// Overrides the compensation retry behavior.
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Assembles the three-step saga for one onboarding run.
    pub fn build(&self, saga_id: SagaId, data: OnboardingData) -> Saga<OnboardingData> {
        let create_customers = Arc::clone(&self.customers);
        let delete_customers = Arc::clone(&self.customers);
        let create_applications = Arc::clone(&self.applications);
        let delete_applications = Arc::clone(&self.applications);
        let create_servicing = Arc::clone(&self.servicing);
        let delete_servicing = Arc::clone(&self.servicing);

        Saga::new(Arc::clone(&self.store), saga_id, data)
            .with_strategy(ContinueAllStrategy::new(self.retry_config))
            .add_step(
                STEP_CREATE_CUSTOMER,
                Box::new(move |_token, data| {
                    let customers = create_customers.clone();
                    Box::pin(async move {
                        let customer = customers.create(&data.name, &data.email).await?;
                        data.customer_id = Some(customer.id);
                        Ok(())
                    })
                }),
                Box::new(move |_token, data| {
                    let customers = delete_customers.clone();
                    Box::pin(async move {
                        match data.customer_id {
                            Some(id) => {
                                customers.delete(id).await?;
                                Ok(())
                            }
                            // Nothing was created, nothing to undo.
                            None => Ok(()),
                        }
                    })
                }),
            )
            .add_step(
                STEP_CREATE_APPLICATION,
                Box::new(move |_token, data| {
                    let applications = create_applications.clone();
                    Box::pin(async move {
                        let customer_id = data.customer_id.ok_or("customer ID not available")?;
                        let application = applications
                            .create(ApplicationRequest {
                                customer_id,
                                loan_amount: data.loan_amount,
                                property_value: data.property_value,
                                interest_rate: data.interest_rate,
                                term_years: data.term_years,
                            })
                            .await?;
                        data.application_id = Some(application.id);
                        Ok(())
                    })
                }),
                Box::new(move |_token, data| {
                    let applications = delete_applications.clone();
                    Box::pin(async move {
                        match data.application_id {
                            Some(id) => {
                                applications.delete(id).await?;
                                Ok(())
                            }
                            None => Ok(()),
                        }
                    })
                }),
            )
            .add_step(
                STEP_CREATE_LOAN,
                Box::new(move |_token, data| {
                    let servicing = create_servicing.clone();
                    Box::pin(async move {
                        let customer_id = data.customer_id.ok_or("customer ID not available")?;
                        let mortgage_id =
                            data.application_id.ok_or("application ID not available")?;
                        let loan = servicing
                            .create(LoanRequest {
                                customer_id,
                                mortgage_id,
                                loan_amount: data.loan_amount,
                                interest_rate: data.interest_rate,
                                term_years: data.term_years,
                            })
                            .await?;
                        data.loan_id = Some(loan.id);
                        Ok(())
                    })
                }),
                Box::new(move |_token, data| {
                    let servicing = delete_servicing.clone();
                    Box::pin(async move {
                        match data.loan_id {
                            Some(id) => {
                                servicing.delete(id).await?;
                                Ok(())
                            }
                            None => Ok(()),
                        }
                    })
                }),
            )
    }

    /// Runs one onboarding saga to completion, rolling back on failure.
    ///
    /// On an execution failure the completed steps are compensated before
    /// the step error is returned; a compensation failure outranks it, since
    /// it means the rollback itself is incomplete. Both `execute` and
    /// `compensate` remain callable separately through [`OnboardingSaga::build`].
    pub async fn onboard(
        &self,
        token: &CancellationToken,
        data: OnboardingData,
    ) -> Result<SagaId, SagaError> {
        let saga_id = SagaId::new();
        let mut saga = self.build(saga_id, data);

        match saga.execute(token).await {
            Ok(()) => Ok(saga_id),
            Err(exec_err) => {
                saga.compensate(token).await?;
                Err(exec_err)
            }
        }
    }
}
