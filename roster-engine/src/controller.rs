use shared_types::{page_count, CustomerRecord, CustomerStatus, RosterPage, TotalCount};
use std::sync::Arc;

use crate::config::PagingConfig;
use crate::count::CountRecovery;
use crate::error::{EngineError, Result};
use crate::filter::{FilterState, PseudoFilter, RosterQuery};
use crate::guard::{Generation, RenderGuard};
use crate::reconcile::reconcile_record;
use crate::service::{RosterListener, RosterService};

/// Owns the filter state of one roster session and turns every change into a fetch.
///
/// Mutations run synchronously and each accepted one bumps the generation and hands back
/// exactly one [`PendingFetch`]. The caller awaits or spawns it; when it completes the
/// [`RenderGuard`] drops it unless no newer mutation happened in between.
pub struct RosterPageController {
    service: Arc<dyn RosterService>,
    listener: Arc<dyn RosterListener>,
    paging: PagingConfig,
    filter: FilterState,
    generation: Generation,
    guard: RenderGuard,
}

impl RosterPageController {
    pub fn new(
        service: Arc<dyn RosterService>,
        listener: Arc<dyn RosterListener>,
        paging: PagingConfig,
    ) -> Result<Self> {
        paging.validate()?;
        let generation = Generation::new();
        let guard = RenderGuard::new(generation.clone());

        Ok(Self {
            service,
            listener,
            filter: FilterState::new(paging.default_page_size),
            paging,
            generation,
            guard,
        })
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    pub fn render_guard(&self) -> RenderGuard {
        self.guard.clone()
    }

    /// Replaces the status selection. Page returns to 1.
    pub fn set_status_filter<I>(&mut self, statuses: I) -> PendingFetch
    where
        I: IntoIterator<Item = CustomerStatus>,
    {
        self.filter.statuses = statuses.into_iter().collect();
        self.filter.page = 1;
        self.mutated()
    }

    /// Parses status names first; nothing changes if any name is unknown or a pseudo-filter.
    pub fn set_status_filter_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<PendingFetch> {
        let statuses = names
            .iter()
            .map(|name| {
                name.as_ref()
                    .parse::<CustomerStatus>()
                    .map_err(|e| EngineError::InvalidArgument(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.set_status_filter(statuses))
    }

    pub fn set_pseudo_filter(&mut self, filter: PseudoFilter, enabled: bool) -> PendingFetch {
        match filter {
            PseudoFilter::OldClients => self.filter.pseudo_filters.old_clients = enabled,
        }
        self.filter.page = 1;
        self.mutated()
    }

    pub fn set_pseudo_filter_named(&mut self, name: &str, enabled: bool) -> Result<PendingFetch> {
        let filter = name.parse::<PseudoFilter>()?;
        Ok(self.set_pseudo_filter(filter, enabled))
    }

    /// Moves to page `page`. Asking for the page already shown does nothing.
    pub fn set_page(&mut self, page: u32) -> Result<Option<PendingFetch>> {
        if page == 0 {
            return Err(EngineError::InvalidArgument(
                "page numbers start at 1".to_string(),
            ));
        }
        if page == self.filter.page {
            return Ok(None);
        }
        self.filter.page = page;
        Ok(Some(self.mutated()))
    }

    /// Changes the page size to one of the configured options. Page returns to 1.
    pub fn set_page_size(&mut self, page_size: u32) -> Result<PendingFetch> {
        if !self.paging.page_size_options.contains(&page_size) {
            return Err(EngineError::InvalidArgument(format!(
                "page size {} is not one of {:?}",
                page_size, self.paging.page_size_options
            )));
        }
        self.filter.page_size = page_size;
        self.filter.page = 1;
        Ok(self.mutated())
    }

    /// Re-fetches the current state under a new generation, e.g. after an import.
    pub fn refresh(&mut self) -> PendingFetch {
        self.mutated()
    }

    /// Fetch for the current state and generation without mutating anything.
    pub fn fetch_page(&self) -> PendingFetch {
        PendingFetch {
            generation: self.generation.current(),
            query: self.filter.to_query(),
            min_estimated_pages: self.paging.min_estimated_pages,
            service: self.service.clone(),
            listener: self.listener.clone(),
            guard: self.guard.clone(),
        }
    }

    fn mutated(&mut self) -> PendingFetch {
        let generation = self.generation.advance();
        tracing::debug!(generation, filter = ?self.filter, "Roster filter changed");
        self.fetch_page()
    }
}

/// Outcome of [`PendingFetch::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The page was current and went to the listener.
    Rendered(RosterPage),
    /// A newer generation exists (or this one was already rendered); the page was dropped.
    Discarded(RosterPage),
}

impl Delivery {
    pub fn page(&self) -> &RosterPage {
        match self {
            Delivery::Rendered(page) | Delivery::Discarded(page) => page,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Delivery::Rendered(_))
    }
}

/// One roster request stamped with the generation that was current when it was issued.
pub struct PendingFetch {
    generation: u64,
    query: RosterQuery,
    min_estimated_pages: u32,
    service: Arc<dyn RosterService>,
    listener: Arc<dyn RosterListener>,
    guard: RenderGuard,
}

impl PendingFetch {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &RosterQuery {
        &self.query
    }

    /// Lists the roster, recovers a total and builds the page. Nothing is rendered.
    pub async fn fetch(&self) -> Result<RosterPage> {
        let response = self.service.list_roster(&self.query).await?;
        let reported = response.pagination.total_records();
        let slice_len = response.records.len();

        let recovery = CountRecovery {
            page: self.query.page,
            page_size: self.query.page_size,
            min_estimated_pages: self.min_estimated_pages,
            filtered: self.query.is_filtered(),
        };
        let (mut total, source) = recovery
            .recover(reported, slice_len, self.service.as_ref())
            .await;

        let records: Vec<CustomerRecord> = response
            .records
            .into_iter()
            .map(reconcile_record)
            .collect();
        let records = self.query.apply_client_filter(records);

        // The total describes the unfiltered slice once records are dropped locally.
        if records.len() < slice_len && total.is_exact() {
            total = TotalCount::approximate(total.value);
        }

        tracing::debug!(
            generation = self.generation,
            ?source,
            total = total.value,
            confidence = ?total.confidence,
            records = records.len(),
            "Fetched roster page"
        );

        Ok(RosterPage {
            records,
            total,
            page: self.query.page,
            page_size: self.query.page_size,
            page_count: page_count(total.value, self.query.page_size),
            generation: self.generation,
        })
    }

    /// Fetches and delivers the page if it is still current.
    ///
    /// Failures of the current generation are reported to the listener and returned; the
    /// previously rendered page is left alone. Failures of stale generations are only returned.
    pub async fn run(self) -> Result<Delivery> {
        match self.fetch().await {
            Ok(page) => {
                if self.guard.claim(&page) {
                    self.listener.on_page_ready(&page);
                    Ok(Delivery::Rendered(page))
                } else {
                    tracing::debug!(generation = page.generation, "Discarding stale roster page");
                    Ok(Delivery::Discarded(page))
                }
            }
            Err(e) => {
                if self.guard.is_current(self.generation) {
                    tracing::warn!(generation = self.generation, "Roster fetch failed: {}", e);
                    self.listener.on_fetch_failed(self.generation, &e);
                } else {
                    tracing::debug!(generation = self.generation, "Stale roster fetch failed: {}", e);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeRoster, RecordingListener};
    use shared_types::CountConfidence;
    use std::sync::atomic::Ordering;

    fn controller(
        service: Arc<FakeRoster>,
        listener: Arc<RecordingListener>,
        default_page_size: u32,
    ) -> RosterPageController {
        RosterPageController::new(
            service,
            listener,
            PagingConfig {
                default_page_size,
                page_size_options: vec![10, 25, 40, 100],
                min_estimated_pages: 2,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_full_page_without_total_is_approximate() {
        let service = Arc::new(FakeRoster::with_customers(150).reporting(serde_json::json!(0)));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service.clone(), listener.clone(), 100);

        let page = controller.refresh().fetch().await.unwrap();
        assert_eq!(page.records.len(), 100);
        assert_eq!(page.total.confidence, CountConfidence::Approximate);
        assert!(page.total.value >= 100);
        assert_eq!(page.page_count, page_count(page.total.value, 100));

        let page = controller.set_page(2).unwrap().unwrap().fetch().await.unwrap();
        assert_eq!(page.records.len(), 50);
        assert_eq!(page.total, TotalCount::exact(150));
        assert_eq!(page.page_count, 2);
    }

    #[tokio::test]
    async fn test_short_page_with_empty_pagination_is_exact() {
        let service = Arc::new(FakeRoster::with_customers(40));
        let listener = Arc::new(RecordingListener::default());
        let controller = controller(service, listener, 100);

        let page = controller.fetch_page().fetch().await.unwrap();
        assert_eq!(page.total, TotalCount::exact(40));
        assert_eq!(page.page_count, 1);
    }

    #[tokio::test]
    async fn test_reported_total_is_trusted() {
        let service = Arc::new(FakeRoster::with_customers(30).reporting(serde_json::json!(30)));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service, listener, 10);

        let page = controller.set_page(3).unwrap().unwrap().fetch().await.unwrap();
        assert_eq!(page.total, TotalCount::exact(30));
        assert_eq!(page.page_count, 3);
        assert_eq!(page.records.len(), 10);
    }

    #[tokio::test]
    async fn test_set_page_is_idempotent() {
        let service = Arc::new(FakeRoster::with_customers(5));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service, listener, 10);

        assert!(controller.set_page(2).unwrap().is_some());
        assert_eq!(controller.generation(), 1);

        assert!(controller.set_page(2).unwrap().is_none());
        assert!(controller.set_page(2).unwrap().is_none());
        assert_eq!(controller.generation(), 1);
        assert_eq!(controller.filter().page, 2);
    }

    #[tokio::test]
    async fn test_invalid_arguments_change_nothing() {
        let service = Arc::new(FakeRoster::with_customers(5));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service, listener, 10);
        let before = controller.filter().clone();

        assert!(matches!(controller.set_page(0), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(controller.set_page_size(33), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(
            controller.set_status_filter_names(&["pending", "old_clients"][..]),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(controller.set_status_filter_names(&["nope"][..]).is_err());
        assert!(controller.set_pseudo_filter_named("vip", true).is_err());

        assert_eq!(controller.filter(), &before);
        assert_eq!(controller.generation(), 0);
    }

    #[tokio::test]
    async fn test_every_mutation_bumps_generation_once() {
        let service = Arc::new(FakeRoster::with_customers(5));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service, listener, 10);

        controller.set_page(4).unwrap();
        let fetch = controller.set_status_filter([CustomerStatus::Dnd]);
        assert_eq!(fetch.generation(), 2);
        assert_eq!(controller.filter().page, 1);

        let fetch = controller.set_pseudo_filter_named("old_clients", true).unwrap();
        assert_eq!(fetch.generation(), 3);
        assert!(fetch.query().old_clients);

        let fetch = controller.set_page_size(25).unwrap();
        assert_eq!(fetch.generation(), 4);
        assert_eq!(fetch.query().page_size, 25);

        // Same size again still counts as a transition.
        let fetch = controller.set_page_size(25).unwrap();
        assert_eq!(fetch.generation(), 5);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let service = Arc::new(FakeRoster::with_customers(60));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service.clone(), listener.clone(), 10);

        let gate = service.gate_page(2);
        let fetch_a = controller.set_page(2).unwrap().unwrap();
        assert_eq!(fetch_a.generation(), 1);
        let task_a = tokio::spawn(fetch_a.run());

        let fetch_b = controller.set_status_filter([CustomerStatus::Pending]);
        assert_eq!(fetch_b.generation(), 2);
        let delivery_b = fetch_b.run().await.unwrap();
        assert!(delivery_b.is_rendered());

        // A completes after B.
        gate.notify_one();
        let delivery_a = task_a.await.unwrap().unwrap();
        assert!(!delivery_a.is_rendered());

        let guard = controller.render_guard();
        assert!(!guard.accept(delivery_a.page()));
        assert!(guard.accept(delivery_b.page()));

        let rendered = listener.pages();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].generation, 2);
    }

    #[tokio::test]
    async fn test_one_transition_renders_once() {
        let service = Arc::new(FakeRoster::with_customers(3));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service, listener.clone(), 10);

        let first = controller.refresh();
        let duplicate = controller.fetch_page();
        assert!(first.run().await.unwrap().is_rendered());
        assert!(!duplicate.run().await.unwrap().is_rendered());
        assert_eq!(listener.pages().len(), 1);
    }

    #[tokio::test]
    async fn test_single_status_goes_to_server() {
        let service = Arc::new(FakeRoster::with_customers(20));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service.clone(), listener, 10);

        let page = controller
            .set_status_filter([CustomerStatus::FollowUp])
            .fetch()
            .await
            .unwrap();

        let queries = service.queries();
        assert_eq!(queries.last().unwrap().status, Some(CustomerStatus::FollowUp));
        assert!(page.records.iter().all(|r| r.status == CustomerStatus::FollowUp));
        assert_eq!(page.total, TotalCount::exact(page.records.len() as u64));
    }

    #[tokio::test]
    async fn test_multiple_statuses_filter_client_side() {
        let service = Arc::new(FakeRoster::with_customers(40).reporting(serde_json::json!(40)));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service.clone(), listener, 40);

        let page = controller
            .set_status_filter([CustomerStatus::FollowUp, CustomerStatus::Dnd])
            .fetch()
            .await
            .unwrap();

        let query = service.queries().pop().unwrap();
        assert_eq!(query.status, None);
        assert!(!page.records.is_empty());
        assert!(page.records.len() < 40);
        assert!(page
            .records
            .iter()
            .all(|r| matches!(r.status, CustomerStatus::FollowUp | CustomerStatus::Dnd)));
        assert_eq!(page.total, TotalCount::approximate(40));
    }

    #[tokio::test]
    async fn test_filtered_stats_fallback_is_approximate() {
        let service = Arc::new(FakeRoster::with_customers(100).with_stats(serde_json::json!(100)));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service, listener, 10);

        let page = controller.refresh().fetch().await.unwrap();
        assert_eq!(page.total, TotalCount::exact(100));

        let page = controller
            .set_pseudo_filter(PseudoFilter::OldClients, true)
            .fetch()
            .await
            .unwrap();
        assert_eq!(page.total, TotalCount::approximate(100));
    }

    #[tokio::test]
    async fn test_failure_keeps_last_page() {
        let service = Arc::new(FakeRoster::with_customers(15));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service.clone(), listener.clone(), 10);

        controller.refresh().run().await.unwrap();
        assert_eq!(listener.pages().len(), 1);

        service.fail_listing.store(true, Ordering::SeqCst);
        let result = controller.set_page(2).unwrap().unwrap().run().await;
        assert!(matches!(result, Err(EngineError::Transport(_))));

        assert_eq!(listener.pages().len(), 1);
        assert_eq!(listener.failures(), vec![2]);
    }

    #[tokio::test]
    async fn test_stale_failure_is_not_reported() {
        let service = Arc::new(FakeRoster::with_customers(15));
        let listener = Arc::new(RecordingListener::default());
        let mut controller = controller(service.clone(), listener.clone(), 10);

        service.fail_listing.store(true, Ordering::SeqCst);
        let stale = controller.set_page(2).unwrap().unwrap();
        controller.set_page(1).unwrap();

        assert!(stale.run().await.is_err());
        assert!(listener.failures().is_empty());
    }
}
