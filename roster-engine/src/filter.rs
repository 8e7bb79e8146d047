use serde::Serialize;
use shared_types::{CustomerRecord, CustomerStatus};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Filter predicates computed from another attribute rather than a stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PseudoFilter {
    /// Customers created more than a year ago.
    OldClients,
}

impl FromStr for PseudoFilter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "old_clients" | "oldclients" => Ok(PseudoFilter::OldClients),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown pseudo-filter: {other}"
            ))),
        }
    }
}

impl fmt::Display for PseudoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PseudoFilter::OldClients => f.write_str("old_clients"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PseudoFilters {
    pub old_clients: bool,
}

/// Filter and paging state of one roster session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Empty means no restriction.
    pub statuses: BTreeSet<CustomerStatus>,
    pub pseudo_filters: PseudoFilters,
    pub page: u32,
    pub page_size: u32,
}

impl FilterState {
    pub fn new(page_size: u32) -> Self {
        Self {
            statuses: BTreeSet::new(),
            pseudo_filters: PseudoFilters::default(),
            page: 1,
            page_size,
        }
    }

    pub fn is_filtered(&self) -> bool {
        !self.statuses.is_empty() || self.pseudo_filters.old_clients
    }

    /// Request for the current state. A single status goes to the server; several are
    /// applied to the returned page because the service accepts one status per request.
    pub fn to_query(&self) -> RosterQuery {
        let (status, client_statuses) = match self.statuses.len() {
            0 => (None, BTreeSet::new()),
            1 => (self.statuses.iter().next().copied(), BTreeSet::new()),
            _ => (None, self.statuses.clone()),
        };

        RosterQuery {
            page: self.page,
            page_size: self.page_size,
            status,
            old_clients: self.pseudo_filters.old_clients,
            client_statuses,
        }
    }
}

/// One roster request, detached from the controller so it can outlive later mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterQuery {
    pub page: u32,
    pub page_size: u32,
    pub status: Option<CustomerStatus>,
    pub old_clients: bool,
    /// Statuses applied locally to the returned records, empty when nothing is filtered locally.
    pub client_statuses: BTreeSet<CustomerStatus>,
}

impl RosterQuery {
    pub fn is_filtered(&self) -> bool {
        self.status.is_some() || self.old_clients || !self.client_statuses.is_empty()
    }

    /// Query-string pairs understood by the roster service.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if self.old_clients {
            pairs.push(("oldClients", "true".to_string()));
        }
        pairs
    }

    /// Keeps only records matching the locally applied statuses.
    pub fn apply_client_filter(&self, records: Vec<CustomerRecord>) -> Vec<CustomerRecord> {
        if self.client_statuses.is_empty() {
            return records;
        }
        records
            .into_iter()
            .filter(|record| self.client_statuses.contains(&record.status))
            .collect()
    }
}
