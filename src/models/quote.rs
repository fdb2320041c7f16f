// src/models/quote.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Approved,
    Rejected,
    // Nunca gravado pelo motor: é a visão de um orçamento enviado cuja validade passou.
    Expired,
    Scheduled,
    Converted,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 7] = [
        QuoteStatus::Draft,
        QuoteStatus::Sent,
        QuoteStatus::Approved,
        QuoteStatus::Rejected,
        QuoteStatus::Expired,
        QuoteStatus::Scheduled,
        QuoteStatus::Converted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
            QuoteStatus::Scheduled => "scheduled",
            QuoteStatus::Converted => "converted",
        }
    }

    /// A tabela de transições do fluxo. Único lugar onde ela existe.
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        matches!(
            (self, next),
            (Draft, Sent)
                | (Sent, Approved)
                | (Sent, Rejected)
                | (Approved, Scheduled)
                | (Approved, Converted)
                | (Scheduled, Converted)
        )
    }

    pub fn is_terminal(self) -> bool {
        QuoteStatus::ALL.iter().all(|next| !self.can_transition_to(*next))
    }

    /// Estados a partir dos quais um Job pode ser derivado.
    pub fn is_convertible(self) -> bool {
        self.can_transition_to(QuoteStatus::Converted)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        QuoteStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| AppError::InvalidInput(format!("status de orçamento desconhecido: {}", value)))
    }
}

// --- Valores ---

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[schema(example = "Troca de disjuntor")]
    pub description: String,
    #[schema(example = "2")]
    pub quantity: Decimal,
    #[schema(example = "85.00")]
    pub unit_price: Decimal,
    #[schema(example = "170.00")]
    pub total: Decimal,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Result<Self, AppError> {
        if quantity.is_sign_negative() || unit_price.is_sign_negative() {
            return Err(AppError::InvalidInput(
                "quantidade e preço unitário não podem ser negativos".to_string(),
            ));
        }

        let total = quantity
            .checked_mul(unit_price)
            .ok_or_else(|| amount_overflow("total do item"))?;

        Ok(Self {
            description: description.into(),
            quantity,
            unit_price,
            total: round_money(total),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuoteTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

fn amount_overflow(what: &str) -> AppError {
    AppError::InvalidInput(format!("{} excede o valor máximo suportado", what))
}

impl QuoteTotals {
    pub fn compute(items: &[LineItem], tax_rate: Decimal) -> Result<Self, AppError> {
        let subtotal = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.total))
            .ok_or_else(|| amount_overflow("subtotal"))?;
        let tax = subtotal
            .checked_mul(tax_rate)
            .map(round_money)
            .ok_or_else(|| amount_overflow("imposto"))?;
        let total = subtotal.checked_add(tax).ok_or_else(|| amount_overflow("total"))?;

        Ok(Self { subtotal, tax, total })
    }
}

// --- Orçamento ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "Revisão elétrica completa")]
    pub title: String,
    pub status: QuoteStatus,
    pub items: Vec<LineItem>,
    #[schema(example = "0.08")]
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = Date, example = "2026-11-03")]
    pub scheduled_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub scheduled_time: Option<NaiveTime>,
    pub calendar_event_id: Option<String>,

    pub signature_id: Option<String>,
    pub signed_by: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,

    // Referência fraca para o Job gerado na conversão.
    pub job_id: Option<Uuid>,
}

/// Uma mudança de estado do orçamento, com os dados que só ela pode gravar.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteCommand {
    Send {
        default_expires_at: DateTime<Utc>,
    },
    Approve {
        signed_by: Option<String>,
        signature_id: String,
    },
    Reject {
        reason: Option<String>,
    },
    Schedule {
        date: NaiveDate,
        time: NaiveTime,
        calendar_event_id: String,
    },
    Convert {
        job_id: Uuid,
    },
}

impl QuoteCommand {
    pub fn target(&self) -> QuoteStatus {
        match self {
            QuoteCommand::Send { .. } => QuoteStatus::Sent,
            QuoteCommand::Approve { .. } => QuoteStatus::Approved,
            QuoteCommand::Reject { .. } => QuoteStatus::Rejected,
            QuoteCommand::Schedule { .. } => QuoteStatus::Scheduled,
            QuoteCommand::Convert { .. } => QuoteStatus::Converted,
        }
    }
}

pub const DEFAULT_SIGNER: &str = "Customer";
pub const REJECTION_PREFIX: &str = "Rejection reason: ";

impl Quote {
    pub fn new(
        customer_id: Uuid,
        title: impl Into<String>,
        items: Vec<LineItem>,
        tax_rate: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let totals = QuoteTotals::compute(&items, tax_rate)?;
        Ok(Self {
            id: Uuid::new_v4(),
            customer_id,
            title: title.into(),
            status: QuoteStatus::Draft,
            items,
            tax_rate,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            notes: None,
            created_at: now,
            updated_at: now,
            sent_at: None,
            approved_at: None,
            rejected_at: None,
            expires_at: None,
            scheduled_date: None,
            scheduled_time: None,
            calendar_event_id: None,
            signature_id: None,
            signed_by: None,
            signed_at: None,
            job_id: None,
        })
    }

    pub fn totals(&self) -> QuoteTotals {
        QuoteTotals {
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == QuoteStatus::Sent && self.expires_at.is_some_and(|expires| expires < now)
    }

    /// Status como visto em `now`: um orçamento enviado e vencido aparece como `Expired`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> QuoteStatus {
        if self.is_expired(now) {
            QuoteStatus::Expired
        } else {
            self.status
        }
    }

    pub fn with_effective_status(mut self, now: DateTime<Utc>) -> Self {
        self.status = self.effective_status(now);
        self
    }

    /// Troca os itens (só em rascunho) e recalcula os totais.
    pub fn replace_items(
        &mut self,
        items: Vec<LineItem>,
        tax_rate: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if self.status != QuoteStatus::Draft {
            return Err(AppError::InvalidState(format!(
                "itens só podem ser alterados em rascunho (status atual: {})",
                self.status
            )));
        }

        let tax_rate = tax_rate.unwrap_or(self.tax_rate);
        if tax_rate.is_sign_negative() {
            return Err(AppError::InvalidInput("alíquota não pode ser negativa".to_string()));
        }

        let totals = QuoteTotals::compute(&items, tax_rate)?;
        self.tax_rate = tax_rate;
        self.items = items;
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.total = totals.total;
        self.updated_at = now;
        Ok(())
    }

    /// Aplica uma transição validada pela tabela de estados.
    pub fn apply(&mut self, command: QuoteCommand, now: DateTime<Utc>) -> Result<(), AppError> {
        let from = self.effective_status(now);
        let to = command.target();
        if !from.can_transition_to(to) {
            return Err(AppError::InvalidTransition {
                entity: "quote",
                from: from.as_str(),
                to: to.as_str(),
            });
        }

        match command {
            QuoteCommand::Send { default_expires_at } => {
                self.sent_at = Some(now);
                self.expires_at.get_or_insert(default_expires_at);
            }
            QuoteCommand::Approve {
                signed_by,
                signature_id,
            } => {
                self.approved_at = Some(now);
                self.signature_id = Some(signature_id);
                self.signed_by = Some(
                    signed_by
                        .filter(|name| !name.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_SIGNER.to_string()),
                );
                self.signed_at = Some(now);
            }
            QuoteCommand::Reject { reason } => {
                self.rejected_at = Some(now);
                if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
                    let line = format!("{}{}", REJECTION_PREFIX, reason);
                    self.notes = Some(match self.notes.take() {
                        Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, line),
                        _ => line,
                    });
                }
            }
            QuoteCommand::Schedule {
                date,
                time,
                calendar_event_id,
            } => {
                self.scheduled_date = Some(date);
                self.scheduled_time = Some(time);
                self.calendar_event_id = Some(calendar_event_id);
            }
            QuoteCommand::Convert { job_id } => {
                self.job_id = Some(job_id);
            }
        }

        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}
