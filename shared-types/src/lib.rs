use serde::{Deserialize, Serialize};

pub mod customer;
pub mod import;
pub mod roster;

pub use customer::{
    display_name, split_full_name, BulkCreateRequest, BulkCreateResponse, CallStatus,
    CustomerRecord, CustomerStatus, StatusParseError,
};
pub use import::ImportError;
pub use roster::{
    lenient_number, opaque_id, page_count, AggregateStats, CountConfidence, ImportSummary,
    ListRosterResponse, RawPagination, RawRecord, RosterPage, TotalCount,
};

/// Error body returned by the roster service on failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
