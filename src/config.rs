// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc};

use anyhow::Context;
use rust_decimal::Decimal;

use crate::{
    common::clock::{Clock, SystemClock},
    db::{
        self, CustomerDirectory, CustomerRepository, JobRepository, MemoryStore, PgCustomerRepository,
        PgJobRepository, PgQuoteRepository, QuoteRepository,
    },
    services::{
        crm_service::CrmService,
        delivery_service::DeliveryService,
        document_service::PdfDocumentGenerator,
        export_service::QuickBooksExporter,
        job_service::JobService,
        messaging_service::LogMessenger,
        quote_service::{QuoteService, WorkflowSettings, MAX_QUOTE_VALIDITY_DAYS},
    },
};

// =============================================================================
//  CONFIGURAÇÃO (variáveis de ambiente / .env)
// =============================================================================

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub snapshot_path: Option<PathBuf>,
    pub workflow: WorkflowSettings,
    pub documents_dir: PathBuf,
    pub exports_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub font_name: String,
    pub company_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            db_max_connections: 5,
            snapshot_path: None,
            workflow: WorkflowSettings::default(),
            documents_dir: PathBuf::from("./documents"),
            exports_dir: PathBuf::from("./exports"),
            fonts_dir: PathBuf::from("./fonts"),
            font_name: "Roboto".to_string(),
            company_name: "Fieldops".to_string(),
        }
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_or_default(key, optional_var(key), default)
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ('{}'): {}", key, raw, e)),
        None => Ok(default),
    }
}

fn check_validity_days(days: i64) -> anyhow::Result<i64> {
    if days <= 0 {
        anyhow::bail!("QUOTE_VALIDITY_DAYS deve ser positivo");
    }
    if days > MAX_QUOTE_VALIDITY_DAYS {
        anyhow::bail!("QUOTE_VALIDITY_DAYS não pode passar de {} dias", MAX_QUOTE_VALIDITY_DAYS);
    }
    Ok(days)
}

impl Settings {
    /// Lê as variáveis de ambiente (carregando o `.env`, se existir).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Settings::default();

        let quote_validity_days =
            check_validity_days(parsed_var("QUOTE_VALIDITY_DAYS", defaults.workflow.quote_validity_days)?)?;
        let default_tax_rate: Decimal = parsed_var("DEFAULT_TAX_RATE", defaults.workflow.default_tax_rate)?;
        if default_tax_rate.is_sign_negative() {
            anyhow::bail!("DEFAULT_TAX_RATE não pode ser negativa");
        }

        Ok(Self {
            bind_addr: optional_var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: optional_var("DATABASE_URL"),
            db_max_connections: parsed_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            snapshot_path: optional_var("SNAPSHOT_PATH").map(PathBuf::from),
            workflow: WorkflowSettings {
                quote_validity_days,
                default_tax_rate,
            },
            documents_dir: optional_var("DOCUMENTS_DIR").map(PathBuf::from).unwrap_or(defaults.documents_dir),
            exports_dir: optional_var("EXPORTS_DIR").map(PathBuf::from).unwrap_or(defaults.exports_dir),
            fonts_dir: optional_var("FONTS_DIR").map(PathBuf::from).unwrap_or(defaults.fonts_dir),
            font_name: optional_var("FONT_NAME").unwrap_or(defaults.font_name),
            company_name: optional_var("COMPANY_NAME").unwrap_or(defaults.company_name),
        })
    }
}

// =============================================================================
//  ESTADO DA APLICAÇÃO
// =============================================================================

// Os repositórios escolhidos para o backend configurado.
struct Repositories {
    quotes: Arc<dyn QuoteRepository>,
    jobs: Arc<dyn JobRepository>,
    customers: Arc<dyn CustomerRepository>,
    directory: Arc<dyn CustomerDirectory>,
}

impl Repositories {
    fn memory(store: MemoryStore) -> Self {
        Self {
            quotes: Arc::new(store.clone()),
            jobs: Arc::new(store.clone()),
            customers: Arc::new(store.clone()),
            directory: Arc::new(store),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub crm_service: CrmService,
    pub quote_service: QuoteService,
    pub job_service: JobService,
    pub delivery_service: DeliveryService,
}

impl AppState {
    /// Monta o grafo de dependências: Postgres se houver `DATABASE_URL`, senão memória.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let repos = match &settings.database_url {
            Some(url) => {
                let pool = db::connect_pg(url, settings.db_max_connections).await?;
                let customers = Arc::new(PgCustomerRepository::new(pool.clone()));
                Repositories {
                    quotes: Arc::new(PgQuoteRepository::new(pool.clone())),
                    jobs: Arc::new(PgJobRepository::new(pool)),
                    customers: customers.clone(),
                    directory: customers,
                }
            }
            None => {
                let store = MemoryStore::open(settings.snapshot_path.clone())
                    .await
                    .context("falha ao abrir o snapshot em memória")?;
                match store.snapshot_path() {
                    Some(path) => tracing::info!("💾 Armazenamento em memória com snapshot em {}", path.display()),
                    None => tracing::warn!("⚠️ Armazenamento em memória sem snapshot; os dados somem ao reiniciar"),
                }
                Repositories::memory(store)
            }
        };

        Ok(Self::assemble(settings, repos, Arc::new(SystemClock)))
    }

    /// Estado em memória, com relógio injetado. Usado pelos testes.
    pub fn in_memory(settings: Settings, clock: Arc<dyn Clock>) -> Self {
        Self::assemble(settings, Repositories::memory(MemoryStore::new()), clock)
    }

    fn assemble(settings: Settings, repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        let job_service = JobService::new(
            repos.quotes.clone(),
            repos.jobs.clone(),
            repos.directory.clone(),
            clock.clone(),
        );
        let quote_service = QuoteService::new(
            repos.quotes.clone(),
            repos.directory.clone(),
            job_service.clone(),
            clock.clone(),
            settings.workflow,
        );
        let crm_service = CrmService::new(repos.customers, clock.clone());

        let documents = PdfDocumentGenerator::new(
            settings.documents_dir.clone(),
            settings.fonts_dir.clone(),
            settings.font_name.clone(),
            settings.company_name.clone(),
        );
        let delivery_service = DeliveryService::new(
            repos.quotes,
            repos.jobs,
            repos.directory,
            Arc::new(documents),
            Arc::new(LogMessenger::new(clock.clone())),
            Arc::new(QuickBooksExporter::new(settings.exports_dir.clone(), clock.clone())),
            clock,
        );

        Self {
            settings: Arc::new(settings),
            crm_service,
            quote_service,
            job_service,
            delivery_service,
        }
    }
}
