// src/db/customer_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::crm::Customer};

/// Consulta de clientes usada pelo fluxo de orçamentos.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn get_customer_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError>;
}

#[async_trait]
pub trait CustomerRepository: CustomerDirectory {
    async fn insert(&self, customer: &Customer) -> Result<(), AppError>;

    async fn list(&self) -> Result<Vec<Customer>, AppError>;
}

// =========================================================================
//  POSTGRES
// =========================================================================

#[derive(Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerDirectory for PgCustomerRepository {
    async fn get_customer_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, full_name, email, phone, address, created_at, updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn insert(&self, customer: &Customer) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, full_name, email, phone, address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(customer.id)
        .bind(&customer.full_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, full_name, email, phone, address, created_at, updated_at
            FROM customers
            ORDER BY full_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }
}
