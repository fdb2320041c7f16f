// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "Fieldops API", description = "Orçamentos, jobs e documentos de serviços de campo"),
    paths(
        // --- Clientes ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,

        // --- Orçamentos ---
        handlers::quotes::create_quote,
        handlers::quotes::list_quotes,
        handlers::quotes::get_quote,
        handlers::quotes::update_items,
        handlers::quotes::delete_quote,
        handlers::quotes::send_quote,
        handlers::quotes::approve_quote,
        handlers::quotes::reject_quote,
        handlers::quotes::schedule_quote,
        handlers::quotes::convert_quote,

        // --- Jobs ---
        handlers::jobs::create_job,
        handlers::jobs::list_jobs,
        handlers::jobs::get_job,
        handlers::jobs::update_job_status,
        handlers::jobs::delete_job,

        // --- Documentos ---
        handlers::documents::deliver_quote,
        handlers::documents::issue_invoice,
        handlers::documents::export_record,
    ),
    components(
        schemas(
            // --- Modelos ---
            models::crm::Customer,
            models::quote::QuoteStatus,
            models::quote::LineItem,
            models::quote::Quote,
            models::job::JobStatus,
            models::job::JobPriority,
            models::job::Job,
            models::job::QuoteConversion,

            // --- Integrações ---
            models::integrations::DocumentHandle,
            models::integrations::QuotePdfOptions,
            models::integrations::InvoiceRequest,
            models::integrations::IssuedInvoice,
            models::integrations::DeliveryChannel,
            models::integrations::DeliveryReceipt,
            models::integrations::ExportKind,
            models::integrations::ExportResult,

            // --- Payloads ---
            handlers::customers::CreateCustomerPayload,
            handlers::quotes::LineItemPayload,
            handlers::quotes::CreateQuotePayload,
            handlers::quotes::UpdateItemsPayload,
            handlers::quotes::ApprovePayload,
            handlers::quotes::RejectPayload,
            handlers::quotes::SchedulePayload,
            handlers::jobs::CreateJobPayload,
            handlers::jobs::UpdateJobStatusPayload,
            handlers::documents::DeliverQuotePayload,
            handlers::documents::IssueInvoicePayload,
            handlers::documents::ExportPayload,
        )
    ),
    tags(
        (name = "Clientes", description = "Cadastro de clientes"),
        (name = "Orçamentos", description = "Fluxo de orçamentos: rascunho, envio, aprovação, agendamento e conversão"),
        (name = "Jobs", description = "Ordens de serviço"),
        (name = "Documentos", description = "PDFs, entrega ao cliente e exportação QuickBooks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_workflow_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/quotes/{id}/convert", "/api/jobs/{id}/status", "/api/exports"] {
            assert!(doc.paths.paths.contains_key(path), "rota ausente: {}", path);
        }
    }
}
