//! Recovery of a usable total when the roster service's own count cannot be trusted.
//!
//! The stages run in strict priority order and each is tried only when the previous one
//! produced nothing usable:
//!
//! 1. the total reported with the listing, if positive and finite;
//! 2. the overall count from the aggregate-statistics endpoint, if positive. That endpoint
//!    ignores filters, so the count is only `exact` for an unfiltered listing;
//! 3. a full page came back, so more data probably exists: estimate
//!    `page_size * min_estimated_pages` as `approximate`;
//! 4. a short or empty page is the end of the data: rows on earlier pages plus this slice.

use shared_types::TotalCount;

use crate::service::RosterService;

/// Which stage of the chain produced the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    Reported,
    AggregateStats,
    Estimated,
    ObservedSlice,
}

#[derive(Debug, Clone, Copy)]
pub struct CountRecovery {
    pub page: u32,
    pub page_size: u32,
    pub min_estimated_pages: u32,
    /// Any status or pseudo filter is active on the request.
    pub filtered: bool,
}

impl CountRecovery {
    pub async fn recover(
        &self,
        reported: Option<f64>,
        slice_len: usize,
        service: &dyn RosterService,
    ) -> (TotalCount, CountSource) {
        if let Some(total) = reported.and_then(usable_count) {
            return (TotalCount::exact(total), CountSource::Reported);
        }

        tracing::debug!(?reported, "Reported total unusable, asking aggregate statistics");
        match service.aggregate_stats().await {
            Ok(stats) => {
                if let Some(total) = stats.total_customers().and_then(usable_count) {
                    let count = if self.filtered {
                        TotalCount::approximate(total)
                    } else {
                        TotalCount::exact(total)
                    };
                    return (count, CountSource::AggregateStats);
                }
            }
            Err(e) => {
                tracing::warn!("Aggregate statistics unavailable: {}", e);
            }
        }

        self.from_slice(slice_len)
    }

    /// Stages 3 and 4, which only need the returned slice.
    pub fn from_slice(&self, slice_len: usize) -> (TotalCount, CountSource) {
        let page_size = u64::from(self.page_size);
        let seen = u64::from(self.page.saturating_sub(1)) * page_size + slice_len as u64;

        if self.page_size > 0 && slice_len as u64 == page_size {
            let estimate = (page_size * u64::from(self.min_estimated_pages)).max(seen + 1);
            (TotalCount::approximate(estimate), CountSource::Estimated)
        } else {
            (TotalCount::exact(seen), CountSource::ObservedSlice)
        }
    }
}

/// Positive finite counts only. `NaN`, infinities, zero and negatives are all unusable.
fn usable_count(value: f64) -> Option<u64> {
    if value.is_finite() && value > 0.0 {
        Some(value.ceil() as u64)
    } else {
        None
    }
}
