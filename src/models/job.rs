// src/models/job.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{common::error::AppError, models::quote::Quote};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Scheduled,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Scheduled => "scheduled",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Scheduled, InProgress) | (Scheduled, Cancelled) | (InProgress, Completed) | (InProgress, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        JobStatus::ALL.iter().all(|next| !self.can_transition_to(*next))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| AppError::InvalidInput(format!("status de job desconhecido: {}", value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl JobPriority {
    pub const ALL: [JobPriority; 4] = [
        JobPriority::Low,
        JobPriority::Medium,
        JobPriority::High,
        JobPriority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobPriority::Low => "low",
            JobPriority::Medium => "medium",
            JobPriority::High => "high",
            JobPriority::Urgent => "urgent",
        }
    }
}

impl FromStr for JobPriority {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        JobPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| AppError::InvalidInput(format!("prioridade desconhecida: {}", value)))
    }
}

/// Horário usado quando o orçamento convertido não tinha agendamento.
pub fn default_job_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

// --- Job ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub quote_id: Option<Uuid>,
    #[schema(example = "Revisão elétrica completa")]
    pub title: String,
    pub status: JobStatus,
    pub priority: JobPriority,
    #[schema(value_type = String, format = Date, example = "2026-11-03")]
    pub scheduled_date: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub scheduled_time: NaiveTime,
    pub notes: Option<String>,
    #[schema(example = "437.94")]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(
        customer_id: Uuid,
        title: impl Into<String>,
        scheduled_date: NaiveDate,
        scheduled_time: NaiveTime,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            quote_id: None,
            title: title.into(),
            status: JobStatus::Scheduled,
            priority: JobPriority::default(),
            scheduled_date,
            scheduled_time,
            notes: None,
            total: Decimal::ZERO,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn transition(&mut self, next: JobStatus, now: DateTime<Utc>) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                entity: "job",
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }

        if next == JobStatus::Completed {
            self.completed_at = Some(now);
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

/// Resultado da conversão: o orçamento já `converted` e o job criado a partir dele.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteConversion {
    pub quote: Quote,
    pub job: Job,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job() -> Job {
        let now = Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap();
        Job::new(
            Uuid::new_v4(),
            "Manutenção",
            NaiveDate::from_ymd_opt(2026, 5, 6).unwrap(),
            default_job_time(),
            now,
        )
    }

    #[test]
    fn new_jobs_are_scheduled_with_medium_priority() {
        let job = job();
        assert_eq!(job.status, JobStatus::Scheduled);
        assert_eq!(job.priority, JobPriority::Medium);
        assert_eq!(job.scheduled_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn completing_stamps_completed_at() {
        let mut job = job();
        let later = job.created_at + chrono::Duration::hours(3);
        job.transition(JobStatus::InProgress, later).unwrap();
        job.transition(JobStatus::Completed, later).unwrap();

        assert_eq!(job.completed_at, Some(later));
        assert!(job.status.is_terminal());
    }

    #[test]
    fn cannot_skip_straight_to_completed() {
        let mut job = job();
        let err = job.transition(JobStatus::Completed, job.created_at).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition { entity: "job", from: "scheduled", to: "completed" }
        ));
    }

    #[test]
    fn cancelled_jobs_stay_cancelled() {
        let mut job = job();
        job.transition(JobStatus::Cancelled, job.created_at).unwrap();
        assert!(job.transition(JobStatus::InProgress, job.created_at).is_err());
    }
}
