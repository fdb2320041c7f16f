// src/services/delivery_service.rs

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::{CustomerDirectory, JobRepository, QuoteRepository},
    models::{
        crm::Customer,
        integrations::{
            DeliveryChannel, DeliveryReceipt, EmailAttachment, ExportKind, ExportResult, InvoiceRequest,
            IssuedInvoice, QuotePdfOptions,
        },
        quote::{Quote, QuoteStatus},
    },
    services::{document_service::DocumentGenerator, export_service::Exporter, messaging_service::Messenger},
};

const INVOICE_TERM_DAYS: i64 = 30;

/// Junta o fluxo de orçamentos com os colaboradores externos (PDF, mensagens, exportação).
#[derive(Clone)]
pub struct DeliveryService {
    quotes: Arc<dyn QuoteRepository>,
    jobs: Arc<dyn JobRepository>,
    customers: Arc<dyn CustomerDirectory>,
    documents: Arc<dyn DocumentGenerator>,
    messenger: Arc<dyn Messenger>,
    exporter: Arc<dyn Exporter>,
    clock: Arc<dyn Clock>,
}

fn is_billable(status: QuoteStatus) -> bool {
    matches!(
        status,
        QuoteStatus::Approved | QuoteStatus::Scheduled | QuoteStatus::Converted
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::InternalServerError(e.into()))
}

impl DeliveryService {
    pub fn new(
        quotes: Arc<dyn QuoteRepository>,
        jobs: Arc<dyn JobRepository>,
        customers: Arc<dyn CustomerDirectory>,
        documents: Arc<dyn DocumentGenerator>,
        messenger: Arc<dyn Messenger>,
        exporter: Arc<dyn Exporter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quotes,
            jobs,
            customers,
            documents,
            messenger,
            exporter,
            clock,
        }
    }

    async fn load_quote(&self, id: Uuid) -> Result<Quote, AppError> {
        let quote = self
            .quotes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("quote", id))?;
        Ok(quote.with_effective_status(self.clock.now()))
    }

    async fn load_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        self.customers
            .get_customer_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("customer", id))
    }

    /// Gera o PDF do orçamento e envia ao cliente pelo canal escolhido.
    pub async fn deliver_quote(
        &self,
        quote_id: Uuid,
        channel: DeliveryChannel,
        options: QuotePdfOptions,
    ) -> Result<DeliveryReceipt, AppError> {
        let quote = self.load_quote(quote_id).await?;
        if quote.status == QuoteStatus::Draft {
            return Err(AppError::InvalidState(
                "orçamento em rascunho; envie-o antes de entregar ao cliente".to_string(),
            ));
        }
        let customer = self.load_customer(quote.customer_id).await?;

        // Valida o contato antes de gastar tempo gerando o PDF
        let recipient = match channel {
            DeliveryChannel::Email => customer.email.clone(),
            DeliveryChannel::Sms => customer.phone.clone(),
        }
        .ok_or_else(|| {
            AppError::InvalidState(format!(
                "cliente {} não tem contato para o canal {:?}",
                customer.id, channel
            ))
        })?;

        let document = self.documents.generate_quote_pdf(&quote, &customer, &options).await?;

        let (reference, status, sent_at) = match channel {
            DeliveryChannel::Email => {
                let html = format!(
                    "<p>Olá {},</p><p>Segue o orçamento <strong>{}</strong> no valor de R$ {:.2}.</p>",
                    customer.full_name, quote.title, quote.total
                );
                let attachments = [EmailAttachment {
                    file_name: document.file_name.clone(),
                    url: document.url.clone(),
                }];
                let receipt = self
                    .messenger
                    .send_email(&recipient, &format!("Orçamento: {}", quote.title), &html, &attachments)
                    .await?;
                (receipt.message_id, receipt.status, receipt.sent_at)
            }
            DeliveryChannel::Sms => {
                let message = format!(
                    "Olá {}, seu orçamento \"{}\" ficou em R$ {:.2}.",
                    customer.full_name, quote.title, quote.total
                );
                let receipt = self
                    .messenger
                    .send_sms(&recipient, &message, Some(&document.url))
                    .await?;
                (receipt.sid, receipt.status, receipt.sent_at)
            }
        };

        tracing::info!(quote_id = %quote_id, channel = ?channel, "Orçamento entregue ao cliente");
        Ok(DeliveryReceipt {
            channel,
            recipient,
            document,
            reference,
            status,
            sent_at,
        })
    }

    /// Fatura de um orçamento aprovado, agendado ou convertido.
    pub async fn issue_invoice(
        &self,
        quote_id: Uuid,
        due_date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> Result<IssuedInvoice, AppError> {
        let quote = self.load_quote(quote_id).await?;
        if !is_billable(quote.status) {
            return Err(AppError::InvalidState(format!(
                "orçamento '{}' ainda não pode ser faturado",
                quote.status
            )));
        }
        let customer = self.load_customer(quote.customer_id).await?;

        let today = self.clock.now().date_naive();
        let invoice = InvoiceRequest {
            invoice_id: format!("INV-{}", &Uuid::new_v4().simple().to_string()[..8].to_uppercase()),
            due_date: due_date.unwrap_or(today + Duration::days(INVOICE_TERM_DAYS)),
            notes,
        };
        let document = self.documents.generate_invoice_pdf(&quote, &customer, &invoice).await?;

        tracing::info!(quote_id = %quote_id, invoice_id = %invoice.invoice_id, "Fatura emitida");
        Ok(IssuedInvoice { invoice, document })
    }

    pub async fn export(&self, kind: ExportKind, id: Uuid) -> Result<ExportResult, AppError> {
        let data = match kind {
            ExportKind::Customer => to_json(&self.load_customer(id).await?)?,
            ExportKind::Job => {
                let job = self
                    .jobs
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("job", id))?;
                to_json(&job)?
            }
            ExportKind::Estimate => to_json(&self.load_quote(id).await?)?,
            ExportKind::Invoice | ExportKind::SalesReceipt => {
                let quote = self.load_quote(id).await?;
                if !is_billable(quote.status) {
                    return Err(AppError::InvalidState(format!(
                        "orçamento '{}' não pode ser exportado como {}",
                        quote.status, kind
                    )));
                }
                to_json(&quote)?
            }
        };

        self.exporter.export_to_quickbooks(data, kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use serde_json::Value;

    use crate::{
        common::clock::FakeClock,
        db::{CustomerRepository, MemoryStore},
        models::integrations::{DocumentHandle, EmailReceipt, SmsReceipt},
        services::messaging_service::LogMessenger,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 9, 16, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct StubDocuments {
        invoices: Mutex<Vec<InvoiceRequest>>,
    }

    #[async_trait]
    impl DocumentGenerator for StubDocuments {
        async fn generate_quote_pdf(
            &self,
            quote: &Quote,
            _customer: &Customer,
            _options: &QuotePdfOptions,
        ) -> Result<DocumentHandle, AppError> {
            Ok(DocumentHandle {
                url: format!("file:///tmp/orcamento_{}.pdf", quote.id),
                file_name: format!("orcamento_{}.pdf", quote.id),
            })
        }

        async fn generate_invoice_pdf(
            &self,
            _quote: &Quote,
            _customer: &Customer,
            invoice: &InvoiceRequest,
        ) -> Result<DocumentHandle, AppError> {
            self.invoices.lock().push(invoice.clone());
            Ok(DocumentHandle {
                url: format!("file:///tmp/fatura_{}.pdf", invoice.invoice_id),
                file_name: format!("fatura_{}.pdf", invoice.invoice_id),
            })
        }
    }

    #[derive(Default)]
    struct RecordingMessenger {
        sms: Mutex<Vec<(String, Option<String>)>>,
        emails: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_sms(&self, to: &str, _message: &str, media_url: Option<&str>) -> Result<SmsReceipt, AppError> {
            self.sms.lock().push((to.to_string(), media_url.map(str::to_string)));
            Ok(SmsReceipt { sid: "SM1".into(), status: "queued".into(), sent_at: now() })
        }

        async fn send_email(
            &self,
            to: &str,
            _subject: &str,
            _html: &str,
            attachments: &[EmailAttachment],
        ) -> Result<EmailReceipt, AppError> {
            self.emails.lock().push((to.to_string(), attachments.len()));
            Ok(EmailReceipt { message_id: "<m1>".into(), status: "sent".into(), sent_at: now() })
        }
    }

    #[derive(Default)]
    struct RecordingExporter {
        exports: Mutex<Vec<(ExportKind, Value)>>,
    }

    #[async_trait]
    impl Exporter for RecordingExporter {
        async fn export_to_quickbooks(&self, data: Value, kind: ExportKind) -> Result<ExportResult, AppError> {
            self.exports.lock().push((kind, data));
            Ok(ExportResult { success: true, file_uri: "file:///tmp/export.json".into() })
        }
    }

    struct Fixture {
        service: DeliveryService,
        documents: Arc<StubDocuments>,
        messenger: Arc<RecordingMessenger>,
        exporter: Arc<RecordingExporter>,
        quote: Quote,
    }

    async fn fixture(status: QuoteStatus, email: Option<&str>) -> Fixture {
        let store = MemoryStore::new();
        let customer = Customer::new(
            "Diego Alves",
            email.map(str::to_string),
            Some("+55 31 3222-1100".into()),
            None,
            now(),
        );
        CustomerRepository::insert(&store, &customer).await.unwrap();
        let mut quote = Quote::new(customer.id, "Ar-condicionado", vec![], Decimal::ZERO, now()).unwrap();
        quote.status = status;
        QuoteRepository::insert(&store, &quote).await.unwrap();

        let documents = Arc::new(StubDocuments::default());
        let messenger = Arc::new(RecordingMessenger::default());
        let exporter = Arc::new(RecordingExporter::default());
        let service = DeliveryService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            documents.clone(),
            messenger.clone(),
            exporter.clone(),
            Arc::new(FakeClock::new(now())),
        );

        Fixture { service, documents, messenger, exporter, quote }
    }

    #[tokio::test]
    async fn email_delivery_attaches_pdf() {
        let f = fixture(QuoteStatus::Sent, Some("diego@example.com")).await;

        let receipt = f
            .service
            .deliver_quote(f.quote.id, DeliveryChannel::Email, QuotePdfOptions::default())
            .await
            .unwrap();

        assert_eq!(receipt.recipient, "diego@example.com");
        assert_eq!(receipt.reference, "<m1>");
        assert!(receipt.document.url.ends_with(".pdf"));
        assert_eq!(f.messenger.emails.lock().clone(), vec![("diego@example.com".to_string(), 1)]);
    }

    #[tokio::test]
    async fn sms_delivery_sends_document_link() {
        let f = fixture(QuoteStatus::Approved, None).await;

        f.service
            .deliver_quote(f.quote.id, DeliveryChannel::Sms, QuotePdfOptions::default())
            .await
            .unwrap();

        let sent = f.messenger.sms.lock().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+55 31 3222-1100");
        assert!(sent[0].1.as_deref().is_some_and(|url| url.contains(&f.quote.id.to_string())));
    }

    #[tokio::test]
    async fn draft_quotes_are_not_delivered() {
        let f = fixture(QuoteStatus::Draft, Some("diego@example.com")).await;
        let err = f
            .service
            .deliver_quote(f.quote.id, DeliveryChannel::Email, QuotePdfOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert!(f.messenger.emails.lock().is_empty());
    }

    #[tokio::test]
    async fn missing_email_is_rejected_before_rendering() {
        let f = fixture(QuoteStatus::Sent, None).await;
        let err = f
            .service
            .deliver_quote(f.quote.id, DeliveryChannel::Email, QuotePdfOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn invoice_defaults_to_thirty_day_term() {
        let f = fixture(QuoteStatus::Converted, None).await;

        let IssuedInvoice { invoice, document } = f.service.issue_invoice(f.quote.id, None, None).await.unwrap();

        assert!(invoice.invoice_id.starts_with("INV-"));
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2026, 10, 9).unwrap());
        assert!(document.file_name.contains(&invoice.invoice_id));
        assert_eq!(f.documents.invoices.lock().len(), 1);
    }

    #[tokio::test]
    async fn sent_quote_is_not_billable() {
        let f = fixture(QuoteStatus::Sent, None).await;
        assert!(matches!(
            f.service.issue_invoice(f.quote.id, None, None).await.unwrap_err(),
            AppError::InvalidState(_)
        ));
        assert!(matches!(
            f.service.export(ExportKind::Invoice, f.quote.id).await.unwrap_err(),
            AppError::InvalidState(_)
        ));
    }

    #[tokio::test]
    async fn estimate_export_serializes_quote() {
        let f = fixture(QuoteStatus::Sent, None).await;

        let result = f.service.export(ExportKind::Estimate, f.quote.id).await.unwrap();

        assert!(result.success);
        let exports = f.exporter.exports.lock();
        assert_eq!(exports[0].0, ExportKind::Estimate);
        assert_eq!(exports[0].1["title"], "Ar-condicionado");
        assert_eq!(exports[0].1["status"], "sent");
    }

    #[tokio::test]
    async fn real_messenger_rejects_malformed_contact() {
        let store = MemoryStore::new();
        let customer = Customer::new("Sem Email", Some("invalido".into()), None, None, now());
        CustomerRepository::insert(&store, &customer).await.unwrap();
        let mut quote = Quote::new(customer.id, "Teste", vec![], Decimal::ZERO, now()).unwrap();
        quote.status = QuoteStatus::Sent;
        QuoteRepository::insert(&store, &quote).await.unwrap();

        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(now()));
        let service = DeliveryService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            Arc::new(StubDocuments::default()),
            Arc::new(LogMessenger::new(clock.clone())),
            Arc::new(RecordingExporter::default()),
            clock,
        );

        let err = service
            .deliver_quote(quote.id, DeliveryChannel::Email, QuotePdfOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Communication(_)));
    }
}
