// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::i18n::Locale;

// Erros do domínio. Os serviços devolvem sempre AppError; a camada HTTP
// converte para ApiError usando o idioma do pedido.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity} não encontrado: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Transição inválida de {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },

    #[error("Estado inválido: {0}")]
    InvalidState(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Dados inválidos: {0}")]
    InvalidInput(String),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Falha ao gerar documento: {0}")]
    DocumentGeneration(String),

    #[error("Falha de comunicação: {0}")]
    Communication(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        AppError::NotFound { entity, id }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. }
            | AppError::InvalidState(_)
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DocumentGeneration(_) | AppError::Communication(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::Io(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Código estável que o frontend usa para escolher a mensagem.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "not_found",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::InvalidState(_) => "invalid_state",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidInput(_) | AppError::ValidationError(_) => "validation",
            AppError::DocumentGeneration(_) => "document_generation",
            AppError::Communication(_) => "communication",
            _ => "internal",
        }
    }

    fn localized_message(&self, lang: &str) -> String {
        let english = lang == "en";
        match self {
            AppError::NotFound { entity, id } if english => format!("{} not found: {}", entity, id),
            AppError::InvalidTransition { entity, from, to } if english => {
                format!("Invalid {} transition: {} -> {}", entity, from, to)
            }
            AppError::InvalidState(detail) if english => format!("Invalid state: {}", detail),
            AppError::Conflict(detail) if english => format!("Conflict: {}", detail),
            AppError::InvalidInput(detail) if english => format!("Invalid input: {}", detail),
            AppError::DocumentGeneration(_) if english => "Could not generate the document.".to_string(),
            AppError::Communication(_) if english => "Could not deliver the message.".to_string(),
            AppError::DocumentGeneration(_) => "Não foi possível gerar o documento.".to_string(),
            AppError::Communication(_) => "Não foi possível enviar a mensagem.".to_string(),
            AppError::DatabaseError(_) | AppError::Io(_) | AppError::InternalServerError(_) => {
                if english {
                    "An unexpected error occurred.".to_string()
                } else {
                    "Ocorreu um erro inesperado.".to_string()
                }
            }
            other => other.to_string(),
        }
    }

    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Erro ao processar pedido: {:?}", self);
        } else {
            tracing::debug!("Pedido rejeitado: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(details)
            }
            _ => None,
        };

        ApiError {
            status,
            code: self.code(),
            message: self.localized_message(&locale.0),
            details,
        }
    }
}

// Resposta de erro já traduzida, pronta para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<std::collections::HashMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({
                "error": self.message,
                "code": self.code,
                "details": details,
            }),
            None => json!({ "error": self.message, "code": self.code }),
        };
        (self.status, Json(body)).into_response()
    }
}
