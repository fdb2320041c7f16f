// src/services/crm_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::CustomerRepository,
    models::crm::Customer,
};

#[derive(Clone)]
pub struct CrmService {
    repo: Arc<dyn CustomerRepository>,
    clock: Arc<dyn Clock>,
}

impl CrmService {
    pub fn new(repo: Arc<dyn CustomerRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn create_customer(
        &self,
        full_name: &str,
        email: Option<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<Customer, AppError> {
        // Campos de contato vazios viram None
        let clean = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let customer = Customer::new(
            full_name.trim(),
            clean(email),
            clean(phone),
            clean(address),
            self.clock.now(),
        );
        self.repo.insert(&customer).await?;

        tracing::info!(customer_id = %customer.id, "Cliente cadastrado");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        self.repo
            .get_customer_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("customer", id))
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        self.repo.list().await
    }
}
