// src/handlers/quotes.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        job::QuoteConversion,
        quote::{LineItem, Quote, QuoteStatus},
    },
    services::quote_service::NewQuote,
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Troca de disjuntor")]
    pub description: String,

    #[schema(value_type = f64, example = 2)]
    pub quantity: Decimal,

    #[schema(value_type = f64, example = 85.0)]
    pub unit_price: Decimal,
}

fn to_line_items(items: Vec<LineItemPayload>) -> Result<Vec<LineItem>, AppError> {
    items
        .into_iter()
        .map(|item| LineItem::new(item.description, item.quantity, item.unit_price))
        .collect()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotePayload {
    pub customer_id: Uuid,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Revisão elétrica completa")]
    pub title: String,

    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LineItemPayload>,

    #[schema(value_type = Option<f64>, example = 0.08)]
    pub tax_rate: Option<Decimal>,

    pub notes: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemsPayload {
    #[validate(nested)]
    pub items: Vec<LineItemPayload>,

    #[schema(value_type = Option<f64>, example = 0.08)]
    pub tax_rate: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePayload {
    #[schema(example = "Maria Souza")]
    pub signed_by: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectPayload {
    #[schema(example = "Preço acima do orçamento")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
    #[schema(value_type = String, format = Date, example = "2026-11-03")]
    pub date: NaiveDate,

    #[schema(value_type = String, example = "14:30:00")]
    pub time: NaiveTime,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuotesQuery {
    /// draft, sent, approved, rejected, expired, scheduled ou converted
    pub status: Option<String>,
}

// =============================================================================
//  CADASTRO
// =============================================================================

// POST /api/quotes
#[utoipa::path(
    post,
    path = "/api/quotes",
    tag = "Orçamentos",
    request_body = CreateQuotePayload,
    responses(
        (status = 201, description = "Orçamento criado em rascunho", body = Quote),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn create_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateQuotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let items = to_line_items(payload.items).map_err(|e| e.to_api_error(&locale))?;

    let quote = app_state
        .quote_service
        .create(NewQuote {
            customer_id: payload.customer_id,
            title: payload.title,
            items,
            tax_rate: payload.tax_rate,
            notes: payload.notes,
            expires_at: payload.expires_at,
        })
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(quote)))
}

// GET /api/quotes?status=sent
#[utoipa::path(
    get,
    path = "/api/quotes",
    tag = "Orçamentos",
    params(ListQuotesQuery),
    responses(
        (status = 200, description = "Orçamentos com o status efetivo", body = Vec<Quote>),
        (status = 400, description = "Status desconhecido")
    )
)]
pub async fn list_quotes(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<QuoteStatus>)
        .transpose()
        .map_err(|e| e.to_api_error(&locale))?;

    let quotes = app_state
        .quote_service
        .list(status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(quotes)))
}

// GET /api/quotes/{id}
#[utoipa::path(
    get,
    path = "/api/quotes/{id}",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Orçamento", body = Quote),
        (status = 404, description = "Orçamento não encontrado")
    )
)]
pub async fn get_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state
        .quote_service
        .get(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(quote)))
}

// PUT /api/quotes/{id}/items
#[utoipa::path(
    put,
    path = "/api/quotes/{id}/items",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = UpdateItemsPayload,
    responses(
        (status = 200, description = "Itens substituídos e totais recalculados", body = Quote),
        (status = 409, description = "Orçamento não está em rascunho")
    )
)]
pub async fn update_items(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let items = to_line_items(payload.items).map_err(|e| e.to_api_error(&locale))?;

    let quote = app_state
        .quote_service
        .update_items(id, items, payload.tax_rate)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(quote)))
}

// DELETE /api/quotes/{id}
#[utoipa::path(
    delete,
    path = "/api/quotes/{id}",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 204, description = "Orçamento apagado"),
        (status = 409, description = "Orçamento já convertido")
    )
)]
pub async fn delete_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .quote_service
        .delete(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  FLUXO
// =============================================================================

// POST /api/quotes/{id}/send
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/send",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Orçamento enviado", body = Quote),
        (status = 409, description = "Transição inválida")
    )
)]
pub async fn send_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state
        .quote_service
        .send(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(quote)))
}

// POST /api/quotes/{id}/approve
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/approve",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body(content = ApprovePayload, description = "Opcional; sem corpo usa os padrões"),
    responses(
        (status = 200, description = "Orçamento aprovado e assinado", body = Quote),
        (status = 409, description = "Transição inválida (inclui orçamento vencido)")
    )
)]
pub async fn approve_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    payload: Option<Json<ApprovePayload>>,
) -> Result<impl IntoResponse, ApiError> {
    // Corpo opcional: POST sem corpo usa os padrões
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let quote = app_state
        .quote_service
        .approve(id, payload.signed_by)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(quote)))
}

// POST /api/quotes/{id}/reject
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/reject",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body(content = RejectPayload, description = "Opcional; sem corpo usa os padrões"),
    responses(
        (status = 200, description = "Orçamento rejeitado", body = Quote),
        (status = 409, description = "Transição inválida")
    )
)]
pub async fn reject_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    payload: Option<Json<RejectPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    // Corpo opcional: POST sem corpo usa os padrões
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let quote = app_state
        .quote_service
        .reject(id, payload.reason)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(quote)))
}

// POST /api/quotes/{id}/schedule
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/schedule",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = SchedulePayload,
    responses(
        (status = 200, description = "Serviço agendado", body = Quote),
        (status = 409, description = "Transição inválida")
    )
)]
pub async fn schedule_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<SchedulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state
        .quote_service
        .schedule(id, payload.date, payload.time)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(quote)))
}

// POST /api/quotes/{id}/convert
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/convert",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 201, description = "Job criado e orçamento convertido", body = QuoteConversion),
        (status = 409, description = "Orçamento não aprovado ou já convertido")
    )
)]
pub async fn convert_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let conversion = app_state
        .quote_service
        .convert_to_job(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(conversion)))
}
