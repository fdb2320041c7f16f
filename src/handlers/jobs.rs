// src/handlers/jobs.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::job::{default_job_time, Job, JobPriority, JobStatus},
    services::job_service::NewJob,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobPayload {
    pub customer_id: Uuid,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Instalação de tomadas")]
    pub title: String,

    #[schema(value_type = String, format = Date, example = "2026-11-03")]
    pub scheduled_date: NaiveDate,

    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub scheduled_time: Option<NaiveTime>,

    pub priority: Option<JobPriority>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobStatusPayload {
    #[schema(example = "in_progress")]
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListJobsQuery {
    /// scheduled, in_progress, completed ou cancelled
    pub status: Option<String>,
}

// POST /api/jobs
#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "Jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job criado", body = Job),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn create_job(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let job = app_state
        .job_service
        .create_job(NewJob {
            customer_id: payload.customer_id,
            title: payload.title,
            scheduled_date: payload.scheduled_date,
            scheduled_time: payload.scheduled_time.unwrap_or_else(default_job_time),
            priority: payload.priority,
            notes: payload.notes,
        })
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(job)))
}

// GET /api/jobs?status=scheduled
#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "Jobs",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Lista de jobs", body = Vec<Job>)
    )
)]
pub async fn list_jobs(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListJobsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<JobStatus>)
        .transpose()
        .map_err(|e| e.to_api_error(&locale))?;

    let jobs = app_state
        .job_service
        .list(status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(jobs)))
}

// GET /api/jobs/{id}
#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "ID do job")),
    responses(
        (status = 200, description = "Job", body = Job),
        (status = 404, description = "Job não encontrado")
    )
)]
pub async fn get_job(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let job = app_state
        .job_service
        .get(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(job)))
}

// PUT /api/jobs/{id}/status
#[utoipa::path(
    put,
    path = "/api/jobs/{id}/status",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "ID do job")),
    request_body = UpdateJobStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Job),
        (status = 400, description = "Status desconhecido"),
        (status = 409, description = "Transição inválida")
    )
)]
pub async fn update_job_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let status: JobStatus = payload.status.parse().map_err(|e: AppError| e.to_api_error(&locale))?;

    let job = app_state
        .job_service
        .update_status(id, status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(job)))
}

// DELETE /api/jobs/{id}
#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "ID do job")),
    responses(
        (status = 204, description = "Job apagado"),
        (status = 404, description = "Job não encontrado")
    )
)]
pub async fn delete_job(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .job_service
        .delete(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
