// src/services/messaging_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    models::integrations::{EmailAttachment, EmailReceipt, SmsReceipt},
};

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_sms(&self, to: &str, message: &str, media_url: Option<&str>) -> Result<SmsReceipt, AppError>;

    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        attachments: &[EmailAttachment],
    ) -> Result<EmailReceipt, AppError>;
}

/// Envio simulado: valida o destinatário, registra no log e devolve um recibo.
#[derive(Clone)]
pub struct LogMessenger {
    clock: Arc<dyn Clock>,
}

impl LogMessenger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

fn is_valid_phone(to: &str) -> bool {
    let digits = to.chars().filter(char::is_ascii_digit).count();
    (8..=15).contains(&digits)
        && to
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
}

fn is_valid_email(to: &str) -> bool {
    match to.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !to.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[async_trait]
impl Messenger for LogMessenger {
    async fn send_sms(&self, to: &str, message: &str, media_url: Option<&str>) -> Result<SmsReceipt, AppError> {
        if !is_valid_phone(to) {
            return Err(AppError::Communication(format!("telefone inválido: '{}'", to)));
        }
        if message.trim().is_empty() {
            return Err(AppError::Communication("mensagem de SMS vazia".to_string()));
        }

        let receipt = SmsReceipt {
            sid: format!("SM{}", Uuid::new_v4().simple()),
            status: "sent".to_string(),
            sent_at: self.clock.now(),
        };
        tracing::info!(to = %to, sid = %receipt.sid, media = ?media_url, "📱 SMS enviado (simulado)");
        Ok(receipt)
    }

    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        attachments: &[EmailAttachment],
    ) -> Result<EmailReceipt, AppError> {
        if !is_valid_email(to) {
            return Err(AppError::Communication(format!("e-mail inválido: '{}'", to)));
        }

        let receipt = EmailReceipt {
            message_id: format!("<{}@fieldops.local>", Uuid::new_v4()),
            status: "sent".to_string(),
            sent_at: self.clock.now(),
        };
        tracing::info!(
            to = %to,
            subject = %subject,
            bytes = html.len(),
            attachments = attachments.len(),
            message_id = %receipt.message_id,
            "📧 E-mail enviado (simulado)"
        );
        Ok(receipt)
    }
}
