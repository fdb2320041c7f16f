// src/services/export_service.rs

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    common::{clock::Clock, error::AppError},
    models::integrations::{ExportKind, ExportResult},
};

#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export_to_quickbooks(&self, data: Value, kind: ExportKind) -> Result<ExportResult, AppError>;
}

/// Grava o registro num arquivo JSON para importação manual no QuickBooks.
#[derive(Clone)]
pub struct QuickBooksExporter {
    exports_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl QuickBooksExporter {
    pub fn new(exports_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            exports_dir: exports_dir.into(),
            clock,
        }
    }
}

#[async_trait]
impl Exporter for QuickBooksExporter {
    async fn export_to_quickbooks(&self, data: Value, kind: ExportKind) -> Result<ExportResult, AppError> {
        let now = self.clock.now();
        tokio::fs::create_dir_all(&self.exports_dir).await?;

        let file_name = format!("quickbooks_{}_{}.json", kind, now.format("%Y%m%d%H%M%S%3f"));
        let path = self.exports_dir.join(file_name);
        let payload = json!({
            "type": kind,
            "exportedAt": now,
            "data": data,
        });

        let bytes = serde_json::to_vec_pretty(&payload).map_err(anyhow::Error::from)?;
        tokio::fs::write(&path, bytes).await?;

        let absolute = std::path::absolute(&path).unwrap_or(path);
        tracing::info!(kind = %kind, file = %absolute.display(), "Exportação QuickBooks gerada");
        Ok(ExportResult {
            success: true,
            file_uri: format!("file://{}", absolute.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::clock::FakeClock;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn writes_typed_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 7, 15, 12, 0, 0).unwrap());
        let exporter = QuickBooksExporter::new(dir.path(), Arc::new(clock));

        let result = exporter
            .export_to_quickbooks(json!({ "fullName": "Rita" }), ExportKind::Customer)
            .await
            .unwrap();

        assert!(result.success);
        let path = result.file_uri.trim_start_matches("file://");
        assert!(path.ends_with("quickbooks_customer_20260715120000000.json"));

        let written: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(written["type"], "customer");
        assert_eq!(written["data"]["fullName"], "Rita");
    }
}
