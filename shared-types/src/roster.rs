use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::customer::CustomerRecord;

/// One fetched page of the roster, ready to hand to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RosterPage {
    pub records: Vec<CustomerRecord>,
    pub total: TotalCount,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    /// Generation of the request that produced this page.
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TotalCount {
    pub value: u64,
    pub confidence: CountConfidence,
}

impl TotalCount {
    pub fn exact(value: u64) -> Self {
        Self {
            value,
            confidence: CountConfidence::Exact,
        }
    }

    pub fn approximate(value: u64) -> Self {
        Self {
            value,
            confidence: CountConfidence::Approximate,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.confidence == CountConfidence::Exact
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CountConfidence {
    Exact,
    Approximate,
}

/// `ceil(total / page_size)`; zero records means zero pages.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Counts reported to the rendering layer once an import finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportSummary {
    pub imported: u64,
    pub skipped: u64,
    pub failed: u64,
    pub total: u64,
}

// Wire types of the roster service. Every field is optional because the service is not
// consistent about what it returns.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRosterResponse {
    #[serde(default, alias = "customers", alias = "data")]
    pub records: Vec<RawRecord>,
    #[serde(default)]
    pub pagination: RawPagination,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPagination {
    #[serde(default, alias = "total_records", alias = "total")]
    pub total_records: Option<serde_json::Value>,
    #[serde(default, alias = "total_pages")]
    pub total_pages: Option<serde_json::Value>,
}

impl RawPagination {
    pub fn total_records(&self) -> Option<f64> {
        self.total_records.as_ref().and_then(lenient_number)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, alias = "_id")]
    pub id: Option<serde_json::Value>,
    #[serde(default, alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, alias = "last_name")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    /// Legacy free-text field that holds either an address or a comment.
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "call_status")]
    pub call_status: Option<String>,
    #[serde(default, alias = "assigned_to")]
    pub assigned_to: Option<serde_json::Value>,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default, alias = "previous_status")]
    pub previous_status: Option<String>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    #[serde(default, alias = "total_customers")]
    pub total_customers: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AggregateStats {
    pub fn total_customers(&self) -> Option<f64> {
        self.total_customers.as_ref().and_then(lenient_number)
    }
}

/// Reads a JSON number or numeric string. `"NaN"` parses to NaN and is left for callers to reject.
pub fn lenient_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Stringifies an opaque identifier that may arrive as a number or a string.
pub fn opaque_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
