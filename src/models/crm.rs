// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- CLIENTE ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,

    #[schema(example = "Maria Souza")]
    pub full_name: String,

    #[schema(example = "maria@example.com")]
    pub email: Option<String>,
    #[schema(example = "+55 11 91234-5678")]
    pub phone: Option<String>,
    #[schema(example = "Rua das Flores, 120 - São Paulo")]
    pub address: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(
        full_name: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
        address: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            email,
            phone,
            address,
            created_at: now,
            updated_at: now,
        }
    }
}
