use importers::{DelimitedReader, NormalizedImport, TabularNormalizer};
use serde::Serialize;
use shared_types::{CustomerRecord, ImportSummary};
use std::path::Path;
use std::sync::Arc;

use crate::config::ImportConfig;
use crate::error::Result;
use crate::service::{RosterListener, RosterService};

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Data rows below the header.
    pub total: u64,
    pub header_row_index: usize,
    /// One message per failed batch.
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            imported: self.imported,
            skipped: self.skipped,
            failed: self.failed,
            total: self.total,
        }
    }
}

/// Normalizes tabular input and hands the records to the roster service in batches.
pub struct RosterImporter {
    service: Arc<dyn RosterService>,
    listener: Arc<dyn RosterListener>,
    reader: DelimitedReader,
    normalizer: TabularNormalizer,
    batch_size: usize,
}

impl RosterImporter {
    pub fn new(
        service: Arc<dyn RosterService>,
        listener: Arc<dyn RosterListener>,
        config: &ImportConfig,
    ) -> Self {
        Self {
            service,
            listener,
            reader: DelimitedReader::new(),
            normalizer: TabularNormalizer::new(),
            batch_size: config.batch_size.max(1),
        }
    }

    pub fn with_reader(mut self, reader: DelimitedReader) -> Self {
        self.reader = reader;
        self
    }

    /// Reads a delimited file and imports it. Only unreadable input is an error.
    pub async fn import_file(&self, path: &Path) -> Result<ImportReport> {
        tracing::info!("Importing roster file {}", path.display());
        let rows = self.reader.read_file(path)?;
        Ok(self.import_rows(&rows).await)
    }

    pub async fn import_rows(&self, rows: &[Vec<String>]) -> ImportReport {
        let normalized = self.normalizer.normalize(rows);
        self.import_normalized(normalized).await
    }

    /// Sends already normalized records. Records without any identity field are skipped, never
    /// sent. Batches go out one after another and a failed batch does not stop the ones after it.
    pub async fn import_normalized(&self, normalized: NormalizedImport) -> ImportReport {
        let total = normalized.data_rows() as u64;
        let (records, anonymous): (Vec<CustomerRecord>, Vec<CustomerRecord>) = normalized
            .records
            .into_iter()
            .partition(|record| !record.lacks_identity());
        if !anonymous.is_empty() {
            tracing::warn!(count = anonymous.len(), "Skipping records without identity fields");
        }

        let mut report = ImportReport {
            skipped: (normalized.skipped + anonymous.len()) as u64,
            total,
            header_row_index: normalized.header_row_index,
            ..ImportReport::default()
        };

        if records.is_empty() {
            tracing::info!(skipped = report.skipped, "Nothing to import");
        }

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            self.send_batch(index, batch, &mut report).await;
        }

        tracing::info!(
            imported = report.imported,
            skipped = report.skipped,
            failed = report.failed,
            total = report.total,
            "Import finished"
        );
        self.listener.on_import_complete(&report.summary());
        report
    }

    async fn send_batch(&self, index: usize, batch: &[CustomerRecord], report: &mut ImportReport) {
        let size = batch.len() as u64;

        match self.service.bulk_create(batch).await {
            Ok(response) => {
                let imported = response.imported_count.min(size);
                if imported + response.error_count != size {
                    tracing::warn!(
                        batch = index,
                        size,
                        imported = response.imported_count,
                        errors = response.error_count,
                        "Bulk create counts do not add up, treating the rest as failed"
                    );
                }
                report.imported += imported;
                report.failed += size - imported;
            }
            Err(e) => {
                tracing::error!(batch = index, size, "Bulk create failed: {}", e);
                report.failed += size;
                report.errors.push(format!("batch {}: {}", index + 1, e));
            }
        }
    }
}
