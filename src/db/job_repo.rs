// src/db/job_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{common::error::AppError, models::job::Job};

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Falha com Conflict se outro job já referencia o mesmo orçamento.
    async fn insert(&self, job: &Job) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, AppError>;

    async fn find_by_quote_id(&self, quote_id: Uuid) -> Result<Option<Job>, AppError>;

    async fn list(&self) -> Result<Vec<Job>, AppError>;

    async fn save(&self, job: &Job) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

pub(crate) fn duplicate_job_conflict(quote_id: Uuid) -> AppError {
    AppError::Conflict(format!("o orçamento {} já foi convertido em job", quote_id))
}

// Nomes das FKs definidos na migração de jobs
const JOBS_QUOTE_FK: &str = "jobs_quote_id_fkey";

/// Traduz uma violação de FK no insert para a entidade que realmente faltou.
fn missing_reference(job: &Job, constraint: Option<&str>) -> AppError {
    match (constraint, job.quote_id) {
        (Some(JOBS_QUOTE_FK), Some(quote_id)) => AppError::not_found("quote", quote_id),
        _ => AppError::not_found("customer", job.customer_id),
    }
}

// =========================================================================
//  POSTGRES
// =========================================================================

#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    customer_id: Uuid,
    quote_id: Option<Uuid>,
    title: String,
    status: String,
    priority: String,
    scheduled_date: NaiveDate,
    scheduled_time: NaiveTime,
    notes: Option<String>,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for Job {
    type Error = AppError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: row.id,
            customer_id: row.customer_id,
            quote_id: row.quote_id,
            title: row.title,
            status: row.status.parse()?,
            priority: row.priority.parse()?,
            scheduled_date: row.scheduled_date,
            scheduled_time: row.scheduled_time,
            notes: row.notes,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

const JOB_COLUMNS: &str = r#"
    id, customer_id, quote_id, title, status, priority, scheduled_date, scheduled_time,
    notes, total, created_at, updated_at, completed_at
"#;

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn insert(&self, job: &Job) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, customer_id, quote_id, title, status, priority, scheduled_date, scheduled_time,
                notes, total, created_at, updated_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(job.id)
        .bind(job.customer_id)
        .bind(job.quote_id)
        .bind(&job.title)
        .bind(job.status.as_str())
        .bind(job.priority.as_str())
        .bind(job.scheduled_date)
        .bind(job.scheduled_time)
        .bind(&job.notes)
        .bind(job.total)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Índice único em jobs.quote_id garante o 1:1 mesmo com pedidos concorrentes
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    if let Some(quote_id) = job.quote_id {
                        return duplicate_job_conflict(quote_id);
                    }
                }
                if db_err.is_foreign_key_violation() {
                    return missing_reference(job, db_err.constraint());
                }
            }
            e.into()
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        let row = sqlx::query_as::<_, JobRow>(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Job::try_from).transpose()
    }

    async fn find_by_quote_id(&self, quote_id: Uuid) -> Result<Option<Job>, AppError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE quote_id = $1",
            JOB_COLUMNS
        ))
        .bind(quote_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Job>, AppError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs ORDER BY scheduled_date ASC, scheduled_time ASC, id ASC",
            JOB_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn save(&self, job: &Job) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET customer_id = $2, quote_id = $3, title = $4, status = $5, priority = $6,
                scheduled_date = $7, scheduled_time = $8, notes = $9, total = $10,
                updated_at = $11, completed_at = $12
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(job.customer_id)
        .bind(job.quote_id)
        .bind(&job.title)
        .bind(job.status.as_str())
        .bind(job.priority.as_str())
        .bind(job.scheduled_date)
        .bind(job.scheduled_time)
        .bind(&job.notes)
        .bind(job.total)
        .bind(job.updated_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("job", job.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::job::default_job_time;

    fn job_for_quote(quote_id: Option<Uuid>) -> Job {
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut job = Job::new(Uuid::new_v4(), "Reforma", date, default_job_time(), Utc::now());
        job.quote_id = quote_id;
        job
    }

    #[test]
    fn foreign_key_violation_names_the_missing_entity() {
        let quote_id = Uuid::new_v4();
        let job = job_for_quote(Some(quote_id));

        let err = missing_reference(&job, Some("jobs_quote_id_fkey"));
        assert!(matches!(err, AppError::NotFound { entity: "quote", id } if id == quote_id));

        let err = missing_reference(&job, Some("jobs_customer_id_fkey"));
        assert!(matches!(err, AppError::NotFound { entity: "customer", .. }));

        let err = missing_reference(&job_for_quote(None), None);
        assert!(matches!(err, AppError::NotFound { entity: "customer", .. }));
    }
}
