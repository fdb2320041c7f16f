// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::integrations::{DeliveryChannel, DeliveryReceipt, ExportKind, ExportResult, IssuedInvoice, QuotePdfOptions},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliverQuotePayload {
    #[schema(example = "email")]
    pub channel: DeliveryChannel,

    #[serde(flatten)]
    pub options: QuotePdfOptions,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueInvoicePayload {
    #[schema(value_type = Option<String>, format = Date, example = "2026-12-01")]
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    #[schema(example = "estimate")]
    pub kind: String,
    pub id: Uuid,
}

// POST /api/quotes/{id}/deliver
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/deliver",
    tag = "Documentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = DeliverQuotePayload,
    responses(
        (status = 200, description = "PDF gerado e enviado ao cliente", body = DeliveryReceipt),
        (status = 409, description = "Orçamento em rascunho ou cliente sem contato"),
        (status = 502, description = "Falha ao gerar o PDF ou enviar a mensagem")
    )
)]
pub async fn deliver_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeliverQuotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = app_state
        .delivery_service
        .deliver_quote(id, payload.channel, payload.options)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(receipt)))
}

// POST /api/quotes/{id}/invoice
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/invoice",
    tag = "Documentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = IssueInvoicePayload,
    responses(
        (status = 201, description = "Fatura emitida", body = IssuedInvoice),
        (status = 409, description = "Orçamento ainda não aprovado"),
        (status = 502, description = "Falha ao gerar o PDF")
    )
)]
pub async fn issue_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<IssueInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = app_state
        .delivery_service
        .issue_invoice(id, payload.due_date, payload.notes)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(issued)))
}

// POST /api/exports
#[utoipa::path(
    post,
    path = "/api/exports",
    tag = "Documentos",
    request_body = ExportPayload,
    responses(
        (status = 201, description = "Arquivo de exportação QuickBooks gerado", body = ExportResult),
        (status = 400, description = "Tipo de exportação desconhecido"),
        (status = 404, description = "Registro não encontrado")
    )
)]
pub async fn export_record(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ExportPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: ExportKind = payload.kind.parse().map_err(|e: AppError| e.to_api_error(&locale))?;

    let result = app_state
        .delivery_service
        .export(kind, payload.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(result)))
}
