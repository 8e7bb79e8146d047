use async_trait::async_trait;
use shared_types::{
    AggregateStats, BulkCreateResponse, CustomerRecord, ImportSummary, ListRosterResponse,
    RosterPage,
};

use crate::error::{EngineError, Result};
use crate::filter::RosterQuery;

/// The external roster backend. Its pagination metadata is unreliable by contract.
#[async_trait]
pub trait RosterService: Send + Sync {
    async fn list_roster(&self, query: &RosterQuery) -> Result<ListRosterResponse>;

    /// Dataset-wide statistics. The counts ignore any filter.
    async fn aggregate_stats(&self) -> Result<AggregateStats>;

    async fn bulk_create(&self, records: &[CustomerRecord]) -> Result<BulkCreateResponse>;
}

/// Callbacks into the rendering layer.
pub trait RosterListener: Send + Sync {
    /// Only accepted, current-generation pages arrive here.
    fn on_page_ready(&self, page: &RosterPage);

    fn on_import_complete(&self, summary: &ImportSummary);

    /// A fetch of the current generation failed. The last rendered page should stay visible.
    fn on_fetch_failed(&self, _generation: u64, _error: &EngineError) {}
}
