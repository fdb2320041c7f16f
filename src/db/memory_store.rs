// src/db/memory_store.rs

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        customer_repo::{CustomerDirectory, CustomerRepository},
        job_repo::{duplicate_job_conflict, JobRepository},
        quote_repo::QuoteRepository,
    },
    models::{crm::Customer, job::Job, quote::Quote},
};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Collections {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    customers: HashMap<Uuid, Customer>,
    #[serde(default)]
    quotes: HashMap<Uuid, Quote>,
    #[serde(default)]
    jobs: HashMap<Uuid, Job>,
}

/// Coleções em memória, com snapshot opcional em arquivo JSON após cada escrita.
///
/// Usado quando não há `DATABASE_URL` e nos testes. As escritas passam uma de
/// cada vez por `commit`: a mudança é aplicada numa cópia, o snapshot da cópia
/// vai para o disco e só então a cópia substitui o estado visível. Se o disco
/// falhar, nada muda em memória.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
    writer: Arc<Mutex<()>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abre o store, carregando o snapshot se o arquivo já existir.
    pub async fn open(snapshot_path: Option<PathBuf>) -> Result<Self, AppError> {
        let collections = match &snapshot_path {
            Some(path) if tokio::fs::try_exists(path).await? => {
                let bytes = tokio::fs::read(path).await?;
                let collections: Collections = serde_json::from_slice(&bytes)
                    .map_err(|e| anyhow::anyhow!("snapshot inválido em {}: {}", path.display(), e))?;
                tracing::info!(
                    path = %path.display(),
                    quotes = collections.quotes.len(),
                    jobs = collections.jobs.len(),
                    "Snapshot carregado"
                );
                collections
            }
            _ => Collections::default(),
        };

        Ok(Self {
            inner: Arc::new(RwLock::new(collections)),
            writer: Arc::new(Mutex::new(())),
            snapshot_path,
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Aplica `change` e grava o snapshot. O estado visível só muda depois que
    /// o arquivo foi escrito.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Collections) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let _writer = self.writer.lock().await;

        let Some(path) = &self.snapshot_path else {
            return change(&mut *self.inner.write());
        };

        let mut next = self.inner.read().clone();
        let value = change(&mut next)?;
        next.version = SNAPSHOT_VERSION;
        let blob = serde_json::to_vec_pretty(&next).map_err(anyhow::Error::from)?;

        if let Err(e) = write_snapshot(path, blob).await {
            tracing::error!(path = %path.display(), "🔥 Falha ao gravar snapshot: {}", e);
            return Err(e);
        }

        *self.inner.write() = next;
        Ok(value)
    }
}

// Escreve num temporário e renomeia, para nunca deixar um snapshot pela metade
async fn write_snapshot(path: &Path, blob: Vec<u8>) -> Result<(), AppError> {
    let tmp = path.with_extension("json.tmp");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&tmp, blob).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl QuoteRepository for MemoryStore {
    async fn insert(&self, quote: &Quote) -> Result<(), AppError> {
        self.commit(|c| {
            if !c.customers.contains_key(&quote.customer_id) {
                return Err(AppError::not_found("customer", quote.customer_id));
            }
            if c.quotes.contains_key(&quote.id) {
                return Err(AppError::Conflict(format!("orçamento {} já existe", quote.id)));
            }
            c.quotes.insert(quote.id, quote.clone());
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Quote>, AppError> {
        Ok(self.inner.read().quotes.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Quote>, AppError> {
        let mut quotes: Vec<Quote> = self.inner.read().quotes.values().cloned().collect();
        quotes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(quotes)
    }

    async fn save(&self, quote: &Quote) -> Result<(), AppError> {
        self.commit(|c| match c.quotes.get_mut(&quote.id) {
            Some(existing) => {
                *existing = quote.clone();
                Ok(())
            }
            None => Err(AppError::not_found("quote", quote.id)),
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        if !self.inner.read().quotes.contains_key(&id) {
            return Ok(false);
        }
        self.commit(|c| Ok(c.quotes.remove(&id).is_some())).await
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn insert(&self, job: &Job) -> Result<(), AppError> {
        self.commit(|c| {
            if !c.customers.contains_key(&job.customer_id) {
                return Err(AppError::not_found("customer", job.customer_id));
            }
            if let Some(quote_id) = job.quote_id {
                if !c.quotes.contains_key(&quote_id) {
                    return Err(AppError::not_found("quote", quote_id));
                }
                if c.jobs.values().any(|existing| existing.quote_id == Some(quote_id)) {
                    return Err(duplicate_job_conflict(quote_id));
                }
            }
            if c.jobs.contains_key(&job.id) {
                return Err(AppError::Conflict(format!("job {} já existe", job.id)));
            }
            c.jobs.insert(job.id, job.clone());
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        Ok(self.inner.read().jobs.get(&id).cloned())
    }

    async fn find_by_quote_id(&self, quote_id: Uuid) -> Result<Option<Job>, AppError> {
        Ok(self
            .inner
            .read()
            .jobs
            .values()
            .find(|job| job.quote_id == Some(quote_id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Job>, AppError> {
        let mut jobs: Vec<Job> = self.inner.read().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| {
            (a.scheduled_date, a.scheduled_time, a.id).cmp(&(b.scheduled_date, b.scheduled_time, b.id))
        });
        Ok(jobs)
    }

    async fn save(&self, job: &Job) -> Result<(), AppError> {
        self.commit(|c| match c.jobs.get_mut(&job.id) {
            Some(existing) => {
                *existing = job.clone();
                Ok(())
            }
            None => Err(AppError::not_found("job", job.id)),
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        if !self.inner.read().jobs.contains_key(&id) {
            return Ok(false);
        }
        self.commit(|c| Ok(c.jobs.remove(&id).is_some())).await
    }
}

#[async_trait]
impl CustomerDirectory for MemoryStore {
    async fn get_customer_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        Ok(self.inner.read().customers.get(&id).cloned())
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn insert(&self, customer: &Customer) -> Result<(), AppError> {
        self.commit(|c| {
            c.customers.insert(customer.id, customer.clone());
            Ok(())
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Customer>, AppError> {
        let mut customers: Vec<Customer> = self.inner.read().customers.values().cloned().collect();
        customers.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(customers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use crate::models::job::default_job_time;

    fn customer() -> Customer {
        Customer::new("Ana Lima", Some("ana@example.com".into()), None, None, Utc::now())
    }

    #[tokio::test]
    async fn rejects_second_job_for_same_quote() {
        let store = MemoryStore::new();
        let customer = customer();
        CustomerRepository::insert(&store, &customer).await.unwrap();

        let quote = Quote::new(customer.id, "Telhado", vec![], Decimal::ZERO, Utc::now()).unwrap();
        QuoteRepository::insert(&store, &quote).await.unwrap();
        let quote_id = quote.id;
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut first = Job::new(customer.id, "Primeiro", date, default_job_time(), Utc::now());
        first.quote_id = Some(quote_id);
        let mut second = Job::new(customer.id, "Segundo", date, default_job_time(), Utc::now());
        second.quote_id = Some(quote_id);

        JobRepository::insert(&store, &first).await.unwrap();
        let err = JobRepository::insert(&store, &second).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(JobRepository::list(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn quotes_require_known_customer() {
        let store = MemoryStore::new();
        let quote = Quote::new(Uuid::new_v4(), "Sem cliente", vec![], Decimal::ZERO, Utc::now()).unwrap();

        let err = QuoteRepository::insert(&store, &quote).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "customer", .. }));
    }

    #[tokio::test]
    async fn save_of_unknown_quote_is_not_found() {
        let store = MemoryStore::new();
        let quote = Quote::new(Uuid::new_v4(), "Fantasma", vec![], Decimal::ZERO, Utc::now()).unwrap();

        let err = QuoteRepository::save(&store, &quote).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "quote", .. }));
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("fieldops.json");

        let store = MemoryStore::open(Some(path.clone())).await.unwrap();
        let customer = customer();
        CustomerRepository::insert(&store, &customer).await.unwrap();
        let quote = Quote::new(customer.id, "Pintura", vec![], Decimal::ZERO, Utc::now()).unwrap();
        QuoteRepository::insert(&store, &quote).await.unwrap();

        let reopened = MemoryStore::open(Some(path)).await.unwrap();
        let loaded = QuoteRepository::find_by_id(&reopened, quote.id).await.unwrap();
        assert_eq!(loaded, Some(quote));
        assert_eq!(
            reopened.get_customer_by_id(customer.id).await.unwrap().map(|c| c.full_name),
            Some("Ana Lima".to_string())
        );
    }

    #[tokio::test]
    async fn jobs_require_known_quote() {
        let store = MemoryStore::new();
        let customer = customer();
        CustomerRepository::insert(&store, &customer).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut job = Job::new(customer.id, "Órfão", date, default_job_time(), Utc::now());
        job.quote_id = Some(Uuid::new_v4());

        let err = JobRepository::insert(&store, &job).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "quote", .. }));
    }

    #[tokio::test]
    async fn failed_snapshot_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fieldops.json");

        let store = MemoryStore::open(Some(path.clone())).await.unwrap();
        let customer = customer();
        CustomerRepository::insert(&store, &customer).await.unwrap();

        // O temporário vira um diretório: a escrita do snapshot falha
        let tmp = path.with_extension("json.tmp");
        std::fs::create_dir(&tmp).unwrap();

        let quote = Quote::new(customer.id, "Portão", vec![], Decimal::ZERO, Utc::now()).unwrap();
        let err = QuoteRepository::insert(&store, &quote).await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert_eq!(QuoteRepository::find_by_id(&store, quote.id).await.unwrap(), None);

        // Com o disco de volta, a mesma escrita passa sem conflito
        std::fs::remove_dir(&tmp).unwrap();
        QuoteRepository::insert(&store, &quote).await.unwrap();
        assert_eq!(QuoteRepository::find_by_id(&store, quote.id).await.unwrap(), Some(quote));
    }

    #[tokio::test]
    async fn concurrent_writes_all_reach_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fieldops.json");
        let store = MemoryStore::open(Some(path.clone())).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let customer = Customer::new(format!("Cliente {i}"), None, None, None, Utc::now());
                CustomerRepository::insert(&store, &customer).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let reopened = MemoryStore::open(Some(path)).await.unwrap();
        assert_eq!(CustomerRepository::list(&reopened).await.unwrap().len(), 16);
    }
}
