// src/models/integrations.rs

// Contratos dos colaboradores externos (documentos, mensagens, exportação).

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

/// Referência opaca para um documento gerado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHandle {
    #[schema(example = "file:///var/lib/fieldops/documents/quote-1f0c.pdf")]
    pub url: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotePdfOptions {
    #[schema(example = "Eletro Serviços Ltda")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub include_signature: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    #[schema(example = "INV-1F0C2A")]
    pub invoice_id: String,
    #[schema(value_type = String, format = Date, example = "2026-12-01")]
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

/// Fatura emitida e o PDF correspondente.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedInvoice {
    pub invoice: InvoiceRequest,
    pub document: DocumentHandle,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SmsReceipt {
    pub sid: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailReceipt {
    pub message_id: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailAttachment {
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    Email,
    Sms,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub channel: DeliveryChannel,
    pub recipient: String,
    pub document: DocumentHandle,
    // sid do SMS ou message id do e-mail
    pub reference: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Invoice,
    Estimate,
    SalesReceipt,
    Job,
    Customer,
}

impl ExportKind {
    pub const ALL: [ExportKind; 5] = [
        ExportKind::Invoice,
        ExportKind::Estimate,
        ExportKind::SalesReceipt,
        ExportKind::Job,
        ExportKind::Customer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExportKind::Invoice => "invoice",
            ExportKind::Estimate => "estimate",
            ExportKind::SalesReceipt => "sales_receipt",
            ExportKind::Job => "job",
            ExportKind::Customer => "customer",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ExportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AppError::InvalidInput(format!("tipo de exportação desconhecido: {}", value)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub success: bool,
    pub file_uri: String,
}
