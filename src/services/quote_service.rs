// src/services/quote_service.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::{CustomerDirectory, QuoteRepository},
    models::{
        job::QuoteConversion,
        quote::{LineItem, Quote, QuoteCommand, QuoteStatus},
    },
    services::job_service::JobService,
};

/// Validade máxima aceita para orçamentos enviados (10 anos).
pub const MAX_QUOTE_VALIDITY_DAYS: i64 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub quote_validity_days: i64,
    pub default_tax_rate: Decimal,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            quote_validity_days: 30,
            default_tax_rate: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewQuote {
    pub customer_id: Uuid,
    pub title: String,
    pub items: Vec<LineItem>,
    pub tax_rate: Option<Decimal>,
    pub notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Motor do fluxo de orçamentos: valida transições e grava os carimbos de tempo.
#[derive(Clone)]
pub struct QuoteService {
    quotes: Arc<dyn QuoteRepository>,
    customers: Arc<dyn CustomerDirectory>,
    job_service: JobService,
    clock: Arc<dyn Clock>,
    settings: WorkflowSettings,
}

impl QuoteService {
    pub fn new(
        quotes: Arc<dyn QuoteRepository>,
        customers: Arc<dyn CustomerDirectory>,
        job_service: JobService,
        clock: Arc<dyn Clock>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            quotes,
            customers,
            job_service,
            clock,
            settings,
        }
    }

    // =========================================================================
    //  CADASTRO
    // =========================================================================

    pub async fn create(&self, new_quote: NewQuote) -> Result<Quote, AppError> {
        if self.customers.get_customer_by_id(new_quote.customer_id).await?.is_none() {
            return Err(AppError::not_found("customer", new_quote.customer_id));
        }

        let tax_rate = new_quote.tax_rate.unwrap_or(self.settings.default_tax_rate);
        if tax_rate.is_sign_negative() {
            return Err(AppError::InvalidInput("alíquota não pode ser negativa".to_string()));
        }

        let now = self.clock.now();
        let mut quote = Quote::new(new_quote.customer_id, new_quote.title, new_quote.items, tax_rate, now)?;
        quote.notes = new_quote.notes;
        quote.expires_at = new_quote.expires_at;

        self.quotes.insert(&quote).await?;
        tracing::info!(quote_id = %quote.id, total = %quote.total, "Orçamento criado");
        Ok(quote)
    }

    pub async fn get(&self, id: Uuid) -> Result<Quote, AppError> {
        let quote = self.load(id).await?;
        Ok(quote.with_effective_status(self.clock.now()))
    }

    /// Lista com o status efetivo (orçamentos vencidos aparecem como `expired`).
    pub async fn list(&self, status: Option<QuoteStatus>) -> Result<Vec<Quote>, AppError> {
        let now = self.clock.now();
        let quotes = self
            .quotes
            .list()
            .await?
            .into_iter()
            .map(|quote| quote.with_effective_status(now))
            .filter(|quote| status.is_none_or(|wanted| quote.status == wanted))
            .collect();
        Ok(quotes)
    }

    pub async fn update_items(
        &self,
        id: Uuid,
        items: Vec<LineItem>,
        tax_rate: Option<Decimal>,
    ) -> Result<Quote, AppError> {
        let now = self.clock.now();
        let mut quote = self.load(id).await?;
        quote.replace_items(items, tax_rate, now)?;
        self.quotes.save(&quote).await?;
        Ok(quote)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let quote = self.load(id).await?;
        // Um job convertido aponta para o orçamento; apagar quebraria a referência
        if quote.status == QuoteStatus::Converted {
            return Err(AppError::InvalidState(format!(
                "o orçamento {} já foi convertido e não pode ser apagado",
                id
            )));
        }

        self.quotes.delete(id).await?;
        tracing::info!(quote_id = %id, "Orçamento apagado");
        Ok(())
    }

    // =========================================================================
    //  TRANSIÇÕES
    // =========================================================================

    pub async fn send(&self, id: Uuid) -> Result<Quote, AppError> {
        let now = self.clock.now();
        let default_expires_at = Duration::try_days(self.settings.quote_validity_days)
            .and_then(|validity| now.checked_add_signed(validity))
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "validade de {} dias fora do intervalo suportado",
                    self.settings.quote_validity_days
                ))
            })?;
        let command = QuoteCommand::Send { default_expires_at };
        self.transition(id, command, now).await
    }

    pub async fn approve(&self, id: Uuid, signed_by: Option<String>) -> Result<Quote, AppError> {
        let command = QuoteCommand::Approve {
            signed_by,
            signature_id: format!("sig_{}", Uuid::new_v4().simple()),
        };
        self.transition(id, command, self.clock.now()).await
    }

    pub async fn reject(&self, id: Uuid, reason: Option<String>) -> Result<Quote, AppError> {
        self.transition(id, QuoteCommand::Reject { reason }, self.clock.now())
            .await
    }

    pub async fn schedule(&self, id: Uuid, date: NaiveDate, time: NaiveTime) -> Result<Quote, AppError> {
        let command = QuoteCommand::Schedule {
            date,
            time,
            calendar_event_id: format!("evt_{}", Uuid::new_v4().simple()),
        };
        self.transition(id, command, self.clock.now()).await
    }

    /// Converte em Job; a derivação (e a marcação `converted`) fica com o JobService.
    pub async fn convert_to_job(&self, id: Uuid) -> Result<QuoteConversion, AppError> {
        self.job_service.create_job_from_quote(id).await
    }

    async fn transition(&self, id: Uuid, command: QuoteCommand, now: DateTime<Utc>) -> Result<Quote, AppError> {
        let mut quote = self.load(id).await?;
        let from = quote.effective_status(now);

        quote.apply(command, now)?;
        self.quotes.save(&quote).await?;

        tracing::info!(quote_id = %id, from = %from, to = %quote.status, "Transição de orçamento aplicada");
        Ok(quote)
    }

    async fn load(&self, id: Uuid) -> Result<Quote, AppError> {
        self.quotes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("quote", id))
    }
}
