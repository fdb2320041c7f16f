// src/db/quote_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::quote::{LineItem, Quote},
};

/// Coleção de orçamentos. Gravações substituem o registro inteiro (última escrita vence).
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn insert(&self, quote: &Quote) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Quote>, AppError>;

    /// Ordenados por data de criação.
    async fn list(&self) -> Result<Vec<Quote>, AppError>;

    /// Falha com NotFound se o orçamento não existir.
    async fn save(&self, quote: &Quote) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

// =========================================================================
//  POSTGRES
// =========================================================================

#[derive(Clone)]
pub struct PgQuoteRepository {
    pool: PgPool,
}

impl PgQuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Linha da tabela `quotes`; status e itens são guardados como TEXT e JSONB.
#[derive(Debug, FromRow)]
struct QuoteRow {
    id: Uuid,
    customer_id: Uuid,
    title: String,
    status: String,
    items: Json<Vec<LineItem>>,
    tax_rate: Decimal,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    scheduled_date: Option<NaiveDate>,
    scheduled_time: Option<NaiveTime>,
    calendar_event_id: Option<String>,
    signature_id: Option<String>,
    signed_by: Option<String>,
    signed_at: Option<DateTime<Utc>>,
    job_id: Option<Uuid>,
}

impl TryFrom<QuoteRow> for Quote {
    type Error = AppError;

    fn try_from(row: QuoteRow) -> Result<Self, Self::Error> {
        Ok(Quote {
            id: row.id,
            customer_id: row.customer_id,
            title: row.title,
            status: row.status.parse()?,
            items: row.items.0,
            tax_rate: row.tax_rate,
            subtotal: row.subtotal,
            tax: row.tax,
            total: row.total,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            sent_at: row.sent_at,
            approved_at: row.approved_at,
            rejected_at: row.rejected_at,
            expires_at: row.expires_at,
            scheduled_date: row.scheduled_date,
            scheduled_time: row.scheduled_time,
            calendar_event_id: row.calendar_event_id,
            signature_id: row.signature_id,
            signed_by: row.signed_by,
            signed_at: row.signed_at,
            job_id: row.job_id,
        })
    }
}

const QUOTE_COLUMNS: &str = r#"
    id, customer_id, title, status, items, tax_rate, subtotal, tax, total, notes,
    created_at, updated_at, sent_at, approved_at, rejected_at, expires_at,
    scheduled_date, scheduled_time, calendar_event_id,
    signature_id, signed_by, signed_at, job_id
"#;

#[async_trait]
impl QuoteRepository for PgQuoteRepository {
    async fn insert(&self, quote: &Quote) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO quotes (
                id, customer_id, title, status, items, tax_rate, subtotal, tax, total, notes,
                created_at, updated_at, sent_at, approved_at, rejected_at, expires_at,
                scheduled_date, scheduled_time, calendar_event_id,
                signature_id, signed_by, signed_at, job_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23)
            "#,
        )
        .bind(quote.id)
        .bind(quote.customer_id)
        .bind(&quote.title)
        .bind(quote.status.as_str())
        .bind(Json(&quote.items))
        .bind(quote.tax_rate)
        .bind(quote.subtotal)
        .bind(quote.tax)
        .bind(quote.total)
        .bind(&quote.notes)
        .bind(quote.created_at)
        .bind(quote.updated_at)
        .bind(quote.sent_at)
        .bind(quote.approved_at)
        .bind(quote.rejected_at)
        .bind(quote.expires_at)
        .bind(quote.scheduled_date)
        .bind(quote.scheduled_time)
        .bind(&quote.calendar_event_id)
        .bind(&quote.signature_id)
        .bind(&quote.signed_by)
        .bind(quote.signed_at)
        .bind(quote.job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_foreign_key_violation() {
                    return AppError::not_found("customer", quote.customer_id);
                }
            }
            e.into()
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Quote>, AppError> {
        let row = sqlx::query_as::<_, QuoteRow>(&format!(
            "SELECT {} FROM quotes WHERE id = $1",
            QUOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Quote::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Quote>, AppError> {
        let rows = sqlx::query_as::<_, QuoteRow>(&format!(
            "SELECT {} FROM quotes ORDER BY created_at ASC, id ASC",
            QUOTE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Quote::try_from).collect()
    }

    async fn save(&self, quote: &Quote) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE quotes
            SET customer_id = $2, title = $3, status = $4, items = $5, tax_rate = $6,
                subtotal = $7, tax = $8, total = $9, notes = $10, updated_at = $11,
                sent_at = $12, approved_at = $13, rejected_at = $14, expires_at = $15,
                scheduled_date = $16, scheduled_time = $17, calendar_event_id = $18,
                signature_id = $19, signed_by = $20, signed_at = $21, job_id = $22
            WHERE id = $1
            "#,
        )
        .bind(quote.id)
        .bind(quote.customer_id)
        .bind(&quote.title)
        .bind(quote.status.as_str())
        .bind(Json(&quote.items))
        .bind(quote.tax_rate)
        .bind(quote.subtotal)
        .bind(quote.tax)
        .bind(quote.total)
        .bind(&quote.notes)
        .bind(quote.updated_at)
        .bind(quote.sent_at)
        .bind(quote.approved_at)
        .bind(quote.rejected_at)
        .bind(quote.expires_at)
        .bind(quote.scheduled_date)
        .bind(quote.scheduled_time)
        .bind(&quote.calendar_event_id)
        .bind(&quote.signature_id)
        .bind(&quote.signed_by)
        .bind(quote.signed_at)
        .bind(quote.job_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("quote", quote.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quotes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
