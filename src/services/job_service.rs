// src/services/job_service.rs

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::{job_repo::duplicate_job_conflict, CustomerDirectory, JobRepository, QuoteRepository},
    models::{
        job::{default_job_time, Job, JobPriority, JobStatus, QuoteConversion},
        quote::{QuoteCommand, QuoteStatus},
    },
};

#[derive(Debug, Clone)]
pub struct NewJob {
    pub customer_id: Uuid,
    pub title: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub priority: Option<JobPriority>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct JobService {
    quotes: Arc<dyn QuoteRepository>,
    jobs: Arc<dyn JobRepository>,
    customers: Arc<dyn CustomerDirectory>,
    clock: Arc<dyn Clock>,
}

impl JobService {
    pub fn new(
        quotes: Arc<dyn QuoteRepository>,
        jobs: Arc<dyn JobRepository>,
        customers: Arc<dyn CustomerDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quotes,
            jobs,
            customers,
            clock,
        }
    }

    // =========================================================================
    //  DERIVAÇÃO A PARTIR DO ORÇAMENTO
    // =========================================================================

    /// Cria o Job de um orçamento aprovado/agendado e marca o orçamento como `converted`.
    ///
    /// As duas escritas valem juntas: se gravar o orçamento falhar, o job recém-criado
    /// é removido antes de devolver o erro.
    pub async fn create_job_from_quote(&self, quote_id: Uuid) -> Result<QuoteConversion, AppError> {
        let now = self.clock.now();
        let mut quote = self
            .quotes
            .find_by_id(quote_id)
            .await?
            .ok_or_else(|| AppError::not_found("quote", quote_id))?;

        // Conversão repetida é conflito, não estado inválido
        if quote.job_id.is_some()
            || quote.status == QuoteStatus::Converted
            || self.jobs.find_by_quote_id(quote_id).await?.is_some()
        {
            return Err(duplicate_job_conflict(quote_id));
        }

        let status = quote.effective_status(now);
        if !status.is_convertible() {
            return Err(AppError::InvalidState(format!(
                "o orçamento {} está '{}'; só aprovados ou agendados viram job",
                quote_id, status
            )));
        }

        let mut job = Job::new(
            quote.customer_id,
            quote.title.clone(),
            quote.scheduled_date.unwrap_or_else(|| now.date_naive()),
            quote.scheduled_time.unwrap_or_else(default_job_time),
            now,
        );
        job.quote_id = Some(quote.id);
        job.total = quote.total;
        job.notes = quote.notes.clone();

        self.jobs.insert(&job).await?;

        let committed = match quote.apply(QuoteCommand::Convert { job_id: job.id }, now) {
            Ok(()) => self.quotes.save(&quote).await,
            Err(err) => Err(err),
        };

        if let Err(err) = committed {
            match self.jobs.delete(job.id).await {
                Ok(_) => tracing::warn!(quote_id = %quote_id, job_id = %job.id, "Conversão desfeita: {}", err),
                Err(rollback_err) => tracing::error!(
                    quote_id = %quote_id,
                    job_id = %job.id,
                    "🔥 Falha ao desfazer job órfão: {}",
                    rollback_err
                ),
            }
            return Err(err);
        }

        tracing::info!(quote_id = %quote_id, job_id = %job.id, "Orçamento convertido em job");
        Ok(QuoteConversion { quote, job })
    }

    // =========================================================================
    //  JOBS AVULSOS
    // =========================================================================

    pub async fn create_job(&self, new_job: NewJob) -> Result<Job, AppError> {
        if self.customers.get_customer_by_id(new_job.customer_id).await?.is_none() {
            return Err(AppError::not_found("customer", new_job.customer_id));
        }

        let mut job = Job::new(
            new_job.customer_id,
            new_job.title,
            new_job.scheduled_date,
            new_job.scheduled_time,
            self.clock.now(),
        );
        job.priority = new_job.priority.unwrap_or_default();
        job.notes = new_job.notes;

        self.jobs.insert(&job).await?;
        tracing::info!(job_id = %job.id, "Job criado manualmente");
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<Job, AppError> {
        self.jobs
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("job", id))
    }

    pub async fn list(&self, status: Option<JobStatus>) -> Result<Vec<Job>, AppError> {
        let jobs = self
            .jobs
            .list()
            .await?
            .into_iter()
            .filter(|job| status.is_none_or(|wanted| job.status == wanted))
            .collect();
        Ok(jobs)
    }

    pub async fn update_status(&self, id: Uuid, status: JobStatus) -> Result<Job, AppError> {
        let mut job = self.get(id).await?;
        let from = job.status;
        job.transition(status, self.clock.now())?;
        self.jobs.save(&job).await?;

        tracing::info!(job_id = %id, from = %from, to = %status, "Status do job alterado");
        Ok(job)
    }

    /// Remove o job. O orçamento de origem mantém o `job_id` como referência histórica.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.jobs.delete(id).await? {
            return Err(AppError::not_found("job", id));
        }
        tracing::info!(job_id = %id, "Job apagado");
        Ok(())
    }
}
