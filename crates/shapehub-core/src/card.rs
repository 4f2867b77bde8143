//! Shape cards
//!
//! A [`ShapeCard`] is the interactive unit for one record. It owns the lazy
//! payload fetch for that record and the export to the host bridge.
//!
//! Payload fetches are single-flight per record: while a request is
//! outstanding, every further trigger joins it and resolves to the same
//! outcome, whichever card it came from. Cards of one session share a
//! [`PayloadFetches`] table, so a card rebuilt after a query change joins the
//! fetch its predecessor started. On success the
//! payload is cached on the record (write-once) and the card notifies its
//! container with [`CardEvent::PayloadCached`]. On failure nothing is cached,
//! so a later trigger issues a fresh request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use shapehub_domain::{Payload, ShapeId, ShapeRecord};
use tokio::sync::mpsc::UnboundedSender;

use crate::bridge::{BridgeStatus, HostBridge};
use crate::error::CatalogError;
use crate::service::CatalogService;

/// Notification from a card to its container
#[derive(Clone, Debug)]
pub enum CardEvent {
    /// The record's payload was fetched and cached
    PayloadCached { record: Arc<ShapeRecord> },
    /// The user asked to see only this uploader's shapes
    FilterByUser { uploader_id: String },
}

/// Result of an export interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Payload handed to the host
    Exported,
    /// Payload available but no host bridge in this environment
    HostUnavailable,
    /// Payload available but the host bridge errored
    HostFailed,
    /// The payload could not be fetched
    FetchFailed,
}

type PayloadFetch = Shared<BoxFuture<'static, Result<Payload, Arc<CatalogError>>>>;

/// In-flight payload fetches keyed by record.
///
/// Clones share the same table.
#[derive(Clone, Default)]
pub struct PayloadFetches {
    in_flight: Arc<Mutex<HashMap<ShapeId, PayloadFetch>>>,
}

impl PayloadFetches {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ShapeId, PayloadFetch>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a payload request for `id` is outstanding
    pub fn is_fetching(&self, id: ShapeId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of outstanding requests
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn join_or_start(&self, id: ShapeId, service: &Arc<dyn CatalogService>) -> PayloadFetch {
        let mut in_flight = self.lock();
        if let Some(fetch) = in_flight.get(&id) {
            tracing::debug!(id = %id, "Joining in-flight payload fetch");
            return fetch.clone();
        }
        let service = service.clone();
        let fetch = async move { service.fetch_payload(id).await.map_err(Arc::new) }
            .boxed()
            .shared();
        in_flight.insert(id, fetch.clone());
        fetch
    }

    fn finish(&self, id: ShapeId, fetch: &PayloadFetch) {
        let mut in_flight = self.lock();
        if in_flight.get(&id).is_some_and(|current| current.ptr_eq(fetch)) {
            in_flight.remove(&id);
        }
    }
}

pub struct ShapeCard {
    record: Arc<ShapeRecord>,
    service: Arc<dyn CatalogService>,
    bridge: HostBridge,
    events: Option<UnboundedSender<CardEvent>>,
    fetches: PayloadFetches,
}

impl ShapeCard {
    pub fn new(record: Arc<ShapeRecord>, service: Arc<dyn CatalogService>, bridge: HostBridge) -> Self {
        Self {
            record,
            service,
            bridge,
            events: None,
            fetches: PayloadFetches::new(),
        }
    }

    /// Share the in-flight fetch table with other cards
    pub fn with_fetches(mut self, fetches: PayloadFetches) -> Self {
        self.fetches = fetches;
        self
    }

    /// Register the container's event channel
    pub fn with_events(mut self, events: UnboundedSender<CardEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn record(&self) -> &Arc<ShapeRecord> {
        &self.record
    }

    /// Whether a payload request is outstanding
    pub fn is_fetching(&self) -> bool {
        self.fetches.is_fetching(self.record.id)
    }

    fn emit(&self, event: CardEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                tracing::debug!(id = %self.record.id, "Card container is gone; event dropped");
            }
        }
    }

    /// The record's payload, fetched on first use.
    pub async fn payload(&self) -> Result<Payload, Arc<CatalogError>> {
        if let Some(payload) = self.record.payload() {
            return Ok(payload.clone());
        }

        let id = self.record.id;
        let fetch = self.fetches.join_or_start(id, &self.service);
        let result = fetch.clone().await;
        self.fetches.finish(id, &fetch);

        match result {
            Ok(payload) => {
                if self.record.cache_payload(payload) {
                    self.emit(CardEvent::PayloadCached {
                        record: self.record.clone(),
                    });
                }
                // First write wins; every waiter sees the cached value.
                Ok(self
                    .record
                    .payload()
                    .cloned()
                    .unwrap_or_else(|| unreachable_payload(&self.record)))
            }
            Err(e) => {
                tracing::warn!(id = %self.record.id, "Payload fetch failed: {}", e);
                Err(e)
            }
        }
    }

    /// Fetch the payload if needed and hand it to the host bridge
    pub async fn export(&self) -> ExportOutcome {
        let payload = match self.payload().await {
            Ok(payload) => payload,
            Err(_) => return ExportOutcome::FetchFailed,
        };

        match self.bridge.export(&payload) {
            BridgeStatus::Delivered => ExportOutcome::Exported,
            BridgeStatus::Unavailable => ExportOutcome::HostUnavailable,
            BridgeStatus::Failed => ExportOutcome::HostFailed,
        }
    }

    /// Ask the container to filter the catalog to this card's uploader
    pub fn request_user_filter(&self) {
        self.emit(CardEvent::FilterByUser {
            uploader_id: self.record.uploader_id.clone(),
        });
    }
}

// cache_payload either filled the cell or found it filled, so it cannot be empty here.
fn unreachable_payload(record: &ShapeRecord) -> Payload {
    tracing::error!(id = %record.id, "Payload cache empty after successful fetch");
    Payload::from("")
}
