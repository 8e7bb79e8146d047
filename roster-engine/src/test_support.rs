use async_trait::async_trait;
use shared_types::{
    AggregateStats, BulkCreateResponse, CustomerRecord, CustomerStatus, ImportSummary,
    ListRosterResponse, RawPagination, RawRecord, RosterPage,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::error::{EngineError, Result};
use crate::filter::RosterQuery;
use crate::service::{RosterListener, RosterService};

/// In-memory roster service. Statuses cycle through every known status.
#[derive(Default)]
pub struct FakeRoster {
    customers: Vec<serde_json::Value>,
    reported_total: Option<serde_json::Value>,
    stats_total: Option<serde_json::Value>,
    pub fail_listing: AtomicBool,
    gate: Mutex<Option<(u32, Arc<Notify>)>>,
    queries: Mutex<Vec<RosterQuery>>,
    /// Zero-based bulk call that fails with a transport error.
    fail_bulk_call: Option<usize>,
    /// Records the service reports as errors in every successful bulk call.
    rejects_per_batch: u64,
    batches: Mutex<Vec<Vec<CustomerRecord>>>,
}

impl FakeRoster {
    pub fn with_customers(count: usize) -> Self {
        let customers = (0..count)
            .map(|i| {
                let status = CustomerStatus::ALL[i % CustomerStatus::ALL.len()];
                serde_json::json!({
                    "_id": i,
                    "firstName": format!("First{i}"),
                    "lastName": format!("Last{i}"),
                    "phone": format!("555-{i:04}"),
                    "status": status.as_str(),
                })
            })
            .collect();

        Self {
            customers,
            ..Self::default()
        }
    }

    pub fn reporting(mut self, total: serde_json::Value) -> Self {
        self.reported_total = Some(total);
        self
    }

    pub fn with_stats(mut self, total: serde_json::Value) -> Self {
        self.stats_total = Some(total);
        self
    }

    pub fn failing_bulk_call(mut self, call: usize) -> Self {
        self.fail_bulk_call = Some(call);
        self
    }

    pub fn rejecting(mut self, per_batch: u64) -> Self {
        self.rejects_per_batch = per_batch;
        self
    }

    /// The next listing of `page` waits until the returned handle is notified.
    pub fn gate_page(&self, page: u32) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some((page, notify.clone()));
        notify
    }

    pub fn queries(&self) -> Vec<RosterQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<CustomerRecord>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl RosterService for FakeRoster {
    async fn list_roster(&self, query: &RosterQuery) -> Result<ListRosterResponse> {
        self.queries.lock().unwrap().push(query.clone());

        let gate = {
            let mut gate = self.gate.lock().unwrap();
            if matches!(gate.as_ref(), Some((page, _)) if *page == query.page) {
                gate.take().map(|(_, notify)| notify)
            } else {
                None
            }
        };
        if let Some(notify) = gate {
            notify.notified().await;
        }

        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(EngineError::Transport("connection reset".to_string()));
        }

        let matching: Vec<&serde_json::Value> = self
            .customers
            .iter()
            .filter(|c| match query.status {
                Some(status) => c["status"] == status.as_str(),
                None => true,
            })
            .collect();
        let size = query.page_size as usize;
        let start = (query.page.saturating_sub(1) as usize) * size;
        let records = matching
            .into_iter()
            .skip(start)
            .take(size)
            .map(|c| serde_json::from_value::<RawRecord>(c.clone()).unwrap())
            .collect();

        Ok(ListRosterResponse {
            records,
            pagination: RawPagination {
                total_records: self.reported_total.clone(),
                total_pages: None,
            },
        })
    }

    async fn aggregate_stats(&self) -> Result<AggregateStats> {
        Ok(AggregateStats {
            total_customers: self.stats_total.clone(),
            extra: Default::default(),
        })
    }

    async fn bulk_create(&self, records: &[CustomerRecord]) -> Result<BulkCreateResponse> {
        let call = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(records.to_vec());
            batches.len() - 1
        };
        if self.fail_bulk_call == Some(call) {
            return Err(EngineError::Transport("bulk endpoint returned 500".to_string()));
        }

        let rejected = self.rejects_per_batch.min(records.len() as u64);
        Ok(BulkCreateResponse {
            imported_count: records.len() as u64 - rejected,
            error_count: rejected,
        })
    }
}

#[derive(Default)]
pub struct RecordingListener {
    pages: Mutex<Vec<RosterPage>>,
    imports: Mutex<Vec<ImportSummary>>,
    failures: Mutex<Vec<u64>>,
}

impl RecordingListener {
    pub fn pages(&self) -> Vec<RosterPage> {
        self.pages.lock().unwrap().clone()
    }

    pub fn imports(&self) -> Vec<ImportSummary> {
        self.imports.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<u64> {
        self.failures.lock().unwrap().clone()
    }
}

impl RosterListener for RecordingListener {
    fn on_page_ready(&self, page: &RosterPage) {
        self.pages.lock().unwrap().push(page.clone());
    }

    fn on_import_complete(&self, summary: &ImportSummary) {
        self.imports.lock().unwrap().push(*summary);
    }

    fn on_fetch_failed(&self, generation: u64, _error: &EngineError) {
        self.failures.lock().unwrap().push(generation);
    }
}
