//! Browse session
//!
//! [`Browser`] is the container that ties the pieces together: it owns the
//! [`CatalogStore`], the current [`QueryParameters`], a [`RenderScheduler`] of
//! [`ShapeCard`]s and the receiving end of the cards' event channel.
//!
//! Query changes that only need local data recompute the view immediately.
//! Switching into a service-ranked sort reloads the catalog first. A load in
//! flight is discarded only when the sort changes before it finishes; filter
//! and search changes let it land and the view is rebuilt under the query
//! current at that moment.
//! A failed reload keeps the previous view on screen and reports the error
//! through [`Browser::display_state`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use shapehub_domain::{ShapeId, ShapeRecord};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::bridge::HostBridge;
use crate::card::{CardEvent, PayloadFetches, ShapeCard};
use crate::catalog::{CatalogStore, CategoryOption, LoadOutcome, LoadState};
use crate::config::BrowseConfig;
use crate::debounce::Debouncer;
use crate::error::{CatalogError, Result};
use crate::locale::{Locale, Messages};
use crate::query::{self, CatalogView, QueryMode, QueryParameters, SortKey};
use crate::render::{RenderScheduler, RenderWindow, ScrollMetrics};
use crate::service::{CatalogService, HttpCatalogService};

/// Tunables of a browse session
#[derive(Clone, Debug, PartialEq)]
pub struct BrowserSettings {
    pub page_size: usize,
    pub scroll_threshold: f64,
    pub search_debounce: Duration,
    pub locale: Locale,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self::from(&BrowseConfig::default())
    }
}

impl From<&BrowseConfig> for BrowserSettings {
    fn from(config: &BrowseConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            scroll_threshold: config.scroll_threshold,
            search_debounce: config.search_debounce(),
            locale: config.locale,
        }
    }
}

/// What the list area should show
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayState {
    /// First load in progress
    Loading(String),
    /// The last load failed; any earlier cards stay visible
    Failed(String),
    /// Loaded, but nothing matches the query
    Empty(String),
    /// Number of entries in the current view
    Cards(usize),
}

pub struct Browser {
    store: Arc<CatalogStore>,
    service: Arc<dyn CatalogService>,
    bridge: HostBridge,
    scheduler: RenderScheduler<Arc<ShapeCard>>,
    query: Mutex<QueryParameters>,
    events_tx: UnboundedSender<CardEvent>,
    events_rx: Mutex<UnboundedReceiver<CardEvent>>,
    payload_fetches: PayloadFetches,
    debouncer: Debouncer,
    settings: BrowserSettings,
}

impl Browser {
    pub fn new(service: Arc<dyn CatalogService>, bridge: HostBridge, settings: BrowserSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store: Arc::new(CatalogStore::new(service.clone())),
            service,
            bridge,
            scheduler: RenderScheduler::new(),
            query: Mutex::new(QueryParameters::default()),
            events_tx,
            events_rx: Mutex::new(events_rx),
            payload_fetches: PayloadFetches::new(),
            debouncer: Debouncer::new(settings.search_debounce),
            settings,
        }
    }

    /// Session against the HTTP catalog service described by `config`
    pub fn from_config(config: &BrowseConfig) -> Result<Self> {
        config.validate()?;
        let service = HttpCatalogService::from_config(config)?;
        let bridge = match &config.host_bridge_path {
            Some(path) => HostBridge::probe(Some(path.clone())),
            None => HostBridge::detect(),
        };
        Ok(Self::new(Arc::new(service), bridge, BrowserSettings::from(config)))
    }

    fn lock_query(&self) -> MutexGuard<'_, QueryParameters> {
        self.query.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Initial load; same as [`reload`](Self::reload)
    pub async fn start(&self) -> std::result::Result<LoadOutcome, CatalogError> {
        self.reload().await
    }

    /// Fetch the catalog under the current sort and rebuild the view.
    ///
    /// The only recovery path after a failed load.
    pub async fn reload(&self) -> std::result::Result<LoadOutcome, CatalogError> {
        let sort = self.query().sort_key;
        let outcome = self.store.load(sort.service_param()).await?;
        if let LoadOutcome::Applied { .. } = outcome {
            self.recompute();
        }
        Ok(outcome)
    }

    /// Replace the whole query.
    ///
    /// Returns an error only when a required catalog reload failed. The query
    /// is updated regardless and the previous view stays in place.
    pub async fn set_query(&self, next: QueryParameters) -> std::result::Result<(), CatalogError> {
        let previous = {
            let mut query = self.lock_query();
            if *query == next {
                return Ok(());
            }
            std::mem::replace(&mut *query, next.clone())
        };
        let superseded = self.store.supersede_pending_load(next.sort_key.service_param());

        match QueryMode::for_change(&previous, &next) {
            // Nothing loaded yet and the only load in flight was dropped
            QueryMode::Local if superseded && self.store.state() == LoadState::Idle => {
                tracing::debug!(sort = %next.sort_key, "Reissuing first catalog load");
                self.reload().await.map(|_| ())
            }
            QueryMode::Local => {
                self.recompute();
                Ok(())
            }
            QueryMode::Remote => {
                tracing::debug!(sort = %next.sort_key, "Reloading catalog for service-ranked sort");
                match self.store.load(next.sort_key.service_param()).await? {
                    LoadOutcome::Applied { .. } => self.recompute(),
                    LoadOutcome::Superseded => {
                        tracing::debug!("Query changed during reload; result dropped")
                    }
                }
                Ok(())
            }
        }
    }

    pub async fn set_search_text(&self, text: impl Into<String>) -> std::result::Result<(), CatalogError> {
        let next = self.query().with_search(text);
        self.set_query(next).await
    }

    pub async fn set_category(&self, category: impl Into<String>) -> std::result::Result<(), CatalogError> {
        let next = self.query().with_category(category);
        self.set_query(next).await
    }

    pub async fn set_sort_key(&self, sort_key: SortKey) -> std::result::Result<(), CatalogError> {
        let next = self.query().with_sort(sort_key);
        self.set_query(next).await
    }

    pub async fn set_user_filter(&self, user: impl Into<String>) -> std::result::Result<(), CatalogError> {
        let next = self.query().with_user(user);
        self.set_query(next).await
    }

    /// Keystroke in the search box.
    ///
    /// Waits for the debounce period and applies `text` only if no newer
    /// keystroke arrived meanwhile. Returns whether it was applied.
    pub async fn search_input(&self, text: impl Into<String>) -> std::result::Result<bool, CatalogError> {
        let text = text.into();
        if !self.debouncer.settle().await {
            tracing::trace!("Search input superseded");
            return Ok(false);
        }
        self.set_search_text(text).await?;
        Ok(true)
    }

    fn recompute(&self) {
        let query = self.query();
        let records = self.store.records();
        let view = query::view(&records, &query);
        tracing::debug!(
            total = records.len(),
            matched = view.len(),
            sort = %query.sort_key,
            "Recomputed catalog view"
        );
        self.scheduler.reset(view);
        self.advance();
    }

    fn make_card(&self, record: &Arc<ShapeRecord>) -> Arc<ShapeCard> {
        Arc::new(
            ShapeCard::new(record.clone(), self.service.clone(), self.bridge.clone())
                .with_events(self.events_tx.clone())
                .with_fetches(self.payload_fetches.clone()),
        )
    }

    /// Materialize the next page of cards
    pub fn advance(&self) -> Vec<Arc<ShapeCard>> {
        self.scheduler
            .advance(self.settings.page_size, |record| self.make_card(record))
    }

    /// Scroll handler: advance when the viewport nears the end of the list
    pub fn on_scroll(&self, metrics: ScrollMetrics) -> Vec<Arc<ShapeCard>> {
        if metrics.near_bottom(self.settings.scroll_threshold) {
            self.advance()
        } else {
            Vec::new()
        }
    }

    /// Drain card notifications. Returns how many were handled.
    pub fn process_events(&self) -> usize {
        let events: Vec<CardEvent> = {
            let mut rx = self
                .events_rx
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::iter::from_fn(|| rx.try_recv().ok()).collect()
        };

        for event in &events {
            match event {
                CardEvent::PayloadCached { record } => {
                    if let Some(payload) = record.payload() {
                        self.store.merge_payload(record.id, payload.clone());
                    }
                }
                CardEvent::FilterByUser { uploader_id } => {
                    tracing::debug!(uploader_id = %uploader_id, "Filtering by uploader");
                    self.apply_local(|query| query.user_filter = uploader_id.clone());
                }
            }
        }
        events.len()
    }

    /// Apply a filter change that keeps the sort, so any load in flight stays
    fn apply_local(&self, change: impl FnOnce(&mut QueryParameters)) {
        {
            let mut query = self.lock_query();
            let before = query.clone();
            change(&mut query);
            if *query == before {
                return;
            }
        }
        self.recompute();
    }

    /// Card for `id`: the materialized one if present, else a fresh card.
    ///
    /// Either way it shares the session's in-flight payload fetches.
    pub fn card(&self, id: ShapeId) -> Option<Arc<ShapeCard>> {
        self.scheduler
            .cards()
            .into_iter()
            .find(|card| card.record().id == id)
            .or_else(|| self.store.get(id).map(|record| self.make_card(&record)))
    }

    pub fn display_state(&self) -> DisplayState {
        let messages = self.messages();
        let view_len = self.scheduler.view().len();
        match self.store.state() {
            LoadState::Failed(_) => DisplayState::Failed(messages.load_error.to_string()),
            LoadState::Idle | LoadState::Loading if view_len == 0 && self.store.is_empty() => {
                DisplayState::Loading(messages.loading.to_string())
            }
            _ if view_len == 0 => DisplayState::Empty(messages.empty.to_string()),
            _ => DisplayState::Cards(view_len),
        }
    }

    pub fn query(&self) -> QueryParameters {
        self.lock_query().clone()
    }

    pub fn view(&self) -> CatalogView {
        self.scheduler.view()
    }

    /// Materialized cards in view order
    pub fn cards(&self) -> Vec<Arc<ShapeCard>> {
        self.scheduler.cards()
    }

    pub fn window(&self) -> RenderWindow {
        self.scheduler.window()
    }

    pub fn has_more(&self) -> bool {
        !self.scheduler.is_exhausted()
    }

    pub fn categories(&self) -> Vec<String> {
        self.store.categories()
    }

    pub fn category_options(&self) -> Vec<CategoryOption> {
        self.store.category_options()
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn service(&self) -> &Arc<dyn CatalogService> {
        &self.service
    }

    pub fn bridge(&self) -> &HostBridge {
        &self.bridge
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    pub fn messages(&self) -> &'static Messages {
        self.settings.locale.messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MemoryCatalogService;

    fn browser_over(shapes: Vec<ShapeRecord>) -> (Browser, MemoryCatalogService) {
        let service = MemoryCatalogService::new(shapes);
        let settings = BrowserSettings {
            page_size: 2,
            ..BrowserSettings::default()
        };
        let browser = Browser::new(Arc::new(service.clone()), HostBridge::Absent, settings);
        (browser, service)
    }

    fn three_shapes() -> Vec<ShapeRecord> {
        vec![
            ShapeRecord::new(1, "Box", "square").with_uploader("7", "alice"),
            ShapeRecord::new(2, "Circle", "round").with_uploader("8", "bob"),
            ShapeRecord::new(3, "Cube", "square").with_uploader("7", "alice"),
        ]
    }

    #[tokio::test]
    async fn test_start_renders_first_page() {
        let (browser, _) = browser_over(three_shapes());
        assert!(matches!(browser.display_state(), DisplayState::Loading(_)));

        browser.start().await.unwrap();
        assert_eq!(browser.display_state(), DisplayState::Cards(3));
        assert_eq!(browser.cards().len(), 2);
        assert!(browser.has_more());
    }

    #[tokio::test]
    async fn test_scroll_far_from_bottom_does_nothing() {
        let (browser, _) = browser_over(three_shapes());
        browser.start().await.unwrap();

        let far = ScrollMetrics {
            scroll_top: 0.0,
            client_height: 500.0,
            scroll_height: 2000.0,
        };
        assert!(browser.on_scroll(far).is_empty());

        let near = ScrollMetrics {
            scroll_top: 1450.0,
            ..far
        };
        assert_eq!(browser.on_scroll(near).len(), 1);
        assert!(!browser.has_more());
    }

    #[tokio::test]
    async fn test_empty_view_message() {
        let (browser, _) = browser_over(three_shapes());
        browser.start().await.unwrap();
        browser.set_search_text("hexagon").await.unwrap();
        assert_eq!(
            browser.display_state(),
            DisplayState::Empty(Locale::En.messages().empty.to_string())
        );
    }

    #[tokio::test]
    async fn test_user_filter_event_from_card() {
        let (browser, service) = browser_over(three_shapes());
        browser.start().await.unwrap();
        service.clear_operations();

        browser.cards()[0].request_user_filter();
        assert_eq!(browser.process_events(), 1);

        assert_eq!(browser.query().user_filter, "7");
        let ids: Vec<u64> = browser.view().ids().into_iter().map(|id| id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(service.operations().is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_query_keeps_window() {
        let (browser, _) = browser_over(three_shapes());
        browser.start().await.unwrap();
        browser.advance();
        assert_eq!(browser.window().cursor(), 3);

        browser.set_query(QueryParameters::default()).await.unwrap();
        assert_eq!(browser.window().cursor(), 3);
    }

    #[tokio::test]
    async fn test_card_lookup_falls_back_to_store() {
        let (browser, _) = browser_over(three_shapes());
        browser.start().await.unwrap();

        // id 3 is not materialized with a page size of 2
        let card = browser.card(ShapeId(3)).unwrap();
        assert_eq!(card.record().name, "Cube");
        assert!(browser.card(ShapeId(42)).is_none());
    }
}
