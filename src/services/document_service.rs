// src/services/document_service.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use genpdf::{elements, style, Element};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::{
        crm::Customer,
        integrations::{DocumentHandle, InvoiceRequest, QuotePdfOptions},
        quote::{LineItem, Quote},
    },
};

/// Gerador de documentos. Para o fluxo é uma caixa-preta que devolve uma URL.
#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    async fn generate_quote_pdf(
        &self,
        quote: &Quote,
        customer: &Customer,
        options: &QuotePdfOptions,
    ) -> Result<DocumentHandle, AppError>;

    async fn generate_invoice_pdf(
        &self,
        quote: &Quote,
        customer: &Customer,
        invoice: &InvoiceRequest,
    ) -> Result<DocumentHandle, AppError>;
}

// Conteúdo comum de orçamento e fatura.
struct PdfLayout {
    document_title: String,
    company_name: String,
    heading: String,
    customer: Customer,
    items: Vec<LineItem>,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
    footer: Vec<String>,
}

/// Renderiza PDFs com genpdf numa pasta local e devolve `file://` URLs.
#[derive(Debug, Clone)]
pub struct PdfDocumentGenerator {
    documents_dir: PathBuf,
    fonts_dir: PathBuf,
    font_name: String,
    company_name: String,
}

impl PdfDocumentGenerator {
    pub fn new(
        documents_dir: impl Into<PathBuf>,
        fonts_dir: impl Into<PathBuf>,
        font_name: impl Into<String>,
        company_name: impl Into<String>,
    ) -> Self {
        Self {
            documents_dir: documents_dir.into(),
            fonts_dir: fonts_dir.into(),
            font_name: font_name.into(),
            company_name: company_name.into(),
        }
    }

    async fn render(&self, layout: PdfLayout, file_name: String) -> Result<DocumentHandle, AppError> {
        tokio::fs::create_dir_all(&self.documents_dir).await?;
        let output = self.documents_dir.join(&file_name);
        let fonts_dir = self.fonts_dir.clone();
        let font_name = self.font_name.clone();

        // genpdf é síncrono e pesado; roda fora do executor
        let path = output.clone();
        tokio::task::spawn_blocking(move || render_layout(layout, &fonts_dir, &font_name, &path))
            .await
            .map_err(|e| AppError::DocumentGeneration(format!("tarefa de renderização abortada: {}", e)))??;

        tracing::info!(file = %output.display(), "📄 Documento gerado");
        Ok(DocumentHandle {
            url: file_url(&output),
            file_name,
        })
    }

    fn layout_for(&self, quote: &Quote, customer: &Customer, company: Option<&str>) -> PdfLayout {
        PdfLayout {
            document_title: quote.title.clone(),
            company_name: company.unwrap_or(&self.company_name).to_string(),
            heading: String::new(),
            customer: customer.clone(),
            items: quote.items.clone(),
            subtotal: quote.subtotal,
            tax: quote.tax,
            total: quote.total,
            footer: Vec::new(),
        }
    }
}

fn short_id(quote: &Quote) -> String {
    quote.id.simple().to_string()[..8].to_uppercase()
}

fn file_url(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

fn render_layout(layout: PdfLayout, fonts_dir: &Path, font_name: &str, output: &Path) -> Result<(), AppError> {
    let pdf_error = |e: genpdf::error::Error| AppError::DocumentGeneration(e.to_string());

    let font_family = genpdf::fonts::from_files(fonts_dir, font_name, None).map_err(|e| {
        AppError::DocumentGeneration(format!("fonte '{}' não encontrada em {}: {}", font_name, fonts_dir.display(), e))
    })?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(layout.document_title);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    doc.push(elements::Paragraph::new(layout.company_name).styled(style::Style::new().bold().with_font_size(18)));
    doc.push(elements::Break::new(1.5));
    doc.push(elements::Paragraph::new(layout.heading).styled(style::Style::new().bold().with_font_size(14)));
    doc.push(elements::Paragraph::new(format!("Cliente: {}", layout.customer.full_name)));
    if let Some(address) = layout.customer.address {
        doc.push(elements::Paragraph::new(address).styled(style::Style::new().with_font_size(10)));
    }
    doc.push(elements::Break::new(2));

    // --- ITENS ---
    let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let style_bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Descrição").styled(style_bold))
        .element(elements::Paragraph::new("Qtd").styled(style_bold))
        .element(elements::Paragraph::new("Unitário").styled(style_bold))
        .element(elements::Paragraph::new("Total").styled(style_bold))
        .push()
        .map_err(pdf_error)?;

    for item in layout.items {
        table
            .row()
            .element(elements::Paragraph::new(item.description))
            .element(elements::Paragraph::new(format!("{:.2}", item.quantity)))
            .element(elements::Paragraph::new(format!("R$ {:.2}", item.unit_price)))
            .element(elements::Paragraph::new(format!("R$ {:.2}", item.total)))
            .push()
            .map_err(pdf_error)?;
    }

    doc.push(table);
    doc.push(elements::Break::new(2));

    // --- TOTAIS ---
    for (label, value, size) in [
        ("Subtotal", layout.subtotal, 10),
        ("Impostos", layout.tax, 10),
        ("TOTAL", layout.total, 12),
    ] {
        let mut paragraph = elements::Paragraph::new(format!("{}: R$ {:.2}", label, value));
        paragraph.set_alignment(genpdf::Alignment::Right);
        doc.push(paragraph.styled(style::Style::new().bold().with_font_size(size)));
    }

    // --- RODAPÉ ---
    if !layout.footer.is_empty() {
        doc.push(elements::Break::new(2));
        for line in layout.footer {
            doc.push(elements::Paragraph::new(line).styled(style::Style::new().italic().with_font_size(9)));
        }
    }

    doc.render_to_file(output).map_err(pdf_error)
}

#[async_trait]
impl DocumentGenerator for PdfDocumentGenerator {
    async fn generate_quote_pdf(
        &self,
        quote: &Quote,
        customer: &Customer,
        options: &QuotePdfOptions,
    ) -> Result<DocumentHandle, AppError> {
        let mut layout = self.layout_for(quote, customer, options.company_name.as_deref());
        layout.heading = format!("ORÇAMENTO #{} - {}", short_id(quote), quote.title);

        if let Some(expires_at) = quote.expires_at {
            layout.footer.push(format!("Válido até {}", expires_at.format("%d/%m/%Y")));
        }
        if options.include_signature {
            match (&quote.signed_by, quote.signed_at) {
                (Some(signer), Some(signed_at)) => layout.footer.push(format!(
                    "Aprovado por {} em {}",
                    signer,
                    signed_at.format("%d/%m/%Y %H:%M")
                )),
                _ => layout.footer.push("Assinatura: ______________________________".to_string()),
            }
        }
        if let Some(notes) = &quote.notes {
            layout.footer.push(notes.clone());
        }

        self.render(layout, format!("orcamento_{}.pdf", quote.id)).await
    }

    async fn generate_invoice_pdf(
        &self,
        quote: &Quote,
        customer: &Customer,
        invoice: &InvoiceRequest,
    ) -> Result<DocumentHandle, AppError> {
        let mut layout = self.layout_for(quote, customer, None);
        layout.heading = format!("FATURA {} - Orçamento #{}", invoice.invoice_id, short_id(quote));
        layout.footer.push(format!("Vencimento: {}", invoice.due_date.format("%d/%m/%Y")));
        if let Some(notes) = &invoice.notes {
            layout.footer.push(notes.clone());
        }

        self.render(layout, format!("fatura_{}.pdf", invoice.invoice_id)).await
    }
}
