//! Catalog store
//!
//! Owns the record set fetched from the catalog service. The set is replaced
//! wholesale on every successful load and otherwise only changes through
//! [`CatalogStore::merge_payload`], which fills a record's write-once payload
//! cache.
//!
//! Loads are ticketed. Each `load` takes a ticket before it suspends on the
//! network and only applies its result if that ticket is still the latest one
//! when the response arrives. Each pending load also remembers the `sort`
//! parameter it was issued with. [`CatalogStore::supersede_pending_load`]
//! bumps the ticket without starting a load when that parameter no longer
//! matches, so a query change can discard a reload issued for a sort that is
//! no longer wanted.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shapehub_domain::{Payload, ShapeId, ShapeRecord};

use crate::error::CatalogError;
use crate::service::CatalogService;

/// Load status of the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet
    Idle,
    /// A load is in flight
    Loading,
    /// The last applied load succeeded
    Ready,
    /// The last applied load failed; records from before it are kept
    Failed(String),
}

/// What happened to a completed load
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the record set
    Applied { count: usize, revision: u64 },
    /// A newer load or query change started meanwhile; the response was dropped
    Superseded,
}

/// A category filter option: normalized value plus the label first seen for it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

struct StoreInner {
    records: Arc<[Arc<ShapeRecord>]>,
    index: HashMap<ShapeId, usize>,
    state: LoadState,
    /// State to fall back to if the in-flight load is superseded
    settled_state: LoadState,
    revision: u64,
    latest_ticket: u64,
    pending_ticket: Option<u64>,
    /// `sort` parameter of the in-flight load
    pending_sort: Option<String>,
}

pub struct CatalogStore {
    service: Arc<dyn CatalogService>,
    inner: RwLock<StoreInner>,
}

impl CatalogStore {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        Self {
            service,
            inner: RwLock::new(StoreInner {
                records: Arc::from(Vec::new()),
                index: HashMap::new(),
                state: LoadState::Idle,
                settled_state: LoadState::Idle,
                revision: 0,
                latest_ticket: 0,
                pending_ticket: None,
                pending_sort: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch the catalog and replace the record set.
    ///
    /// On failure the store enters [`LoadState::Failed`] and keeps its
    /// current records. There is no automatic retry.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, sort: Option<&str>) -> Result<LoadOutcome, CatalogError> {
        let ticket = {
            let mut inner = self.write();
            inner.latest_ticket += 1;
            if inner.pending_ticket.is_none() {
                inner.settled_state = inner.state.clone();
            }
            inner.pending_ticket = Some(inner.latest_ticket);
            inner.pending_sort = sort.map(str::to_string);
            inner.state = LoadState::Loading;
            inner.latest_ticket
        };

        let result = self.service.list_shapes(sort).await;

        let mut inner = self.write();
        if inner.pending_ticket != Some(ticket) {
            tracing::debug!(ticket, "Discarding superseded catalog load");
            return Ok(LoadOutcome::Superseded);
        }
        inner.pending_ticket = None;
        inner.pending_sort = None;

        match result {
            Ok(records) => {
                let count = records.len();
                Self::replace_locked(&mut inner, records);
                inner.state = LoadState::Ready;
                tracing::info!(count, revision = inner.revision, "Catalog loaded");
                Ok(LoadOutcome::Applied {
                    count,
                    revision: inner.revision,
                })
            }
            Err(e) => {
                tracing::warn!("Catalog load failed: {}", e);
                inner.state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Invalidate an in-flight load issued with a `sort` parameter other
    /// than `sort`, so its response is dropped on arrival.
    ///
    /// Returns `true` if a load was superseded. The store then falls back to
    /// the state it had before that load started.
    pub fn supersede_pending_load(&self, sort: Option<&str>) -> bool {
        let mut inner = self.write();
        if inner.pending_ticket.is_none() || inner.pending_sort.as_deref() == sort {
            return false;
        }
        inner.latest_ticket += 1;
        inner.pending_ticket = None;
        inner.state = inner.settled_state.clone();
        tracing::debug!(
            superseded = ?inner.pending_sort.take(),
            wanted = ?sort,
            "Superseded in-flight catalog load"
        );
        true
    }

    /// Replace the record set directly, bypassing the service
    pub fn replace(&self, records: Vec<ShapeRecord>) -> u64 {
        let mut inner = self.write();
        Self::replace_locked(&mut inner, records);
        inner.state = LoadState::Ready;
        inner.revision
    }

    fn replace_locked(inner: &mut StoreInner, records: Vec<ShapeRecord>) {
        // Payloads already fetched this session survive a re-sort.
        let previous: HashMap<ShapeId, Payload> = inner
            .records
            .iter()
            .filter_map(|r| r.payload().map(|p| (r.id, p.clone())))
            .collect();

        let records: Vec<Arc<ShapeRecord>> = records
            .into_iter()
            .map(|record| {
                if let Some(payload) = previous.get(&record.id) {
                    record.cache_payload(payload.clone());
                }
                Arc::new(record)
            })
            .collect();

        inner.index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
        inner.records = Arc::from(records);
        inner.revision += 1;
    }

    /// Merge a fetched payload into the record with `id`.
    ///
    /// Returns `true` if the record's cache was empty and is now filled.
    /// Unknown ids and already-cached records are left alone.
    pub fn merge_payload(&self, id: ShapeId, payload: Payload) -> bool {
        let inner = self.read();
        let Some(&i) = inner.index.get(&id) else {
            tracing::debug!(%id, "Payload for unknown shape ignored");
            return false;
        };
        let merged = inner.records[i].cache_payload(payload);
        if merged {
            tracing::debug!(%id, "Merged payload into catalog");
        }
        merged
    }

    /// Snapshot of the current record set in catalog order
    pub fn records(&self) -> Arc<[Arc<ShapeRecord>]> {
        self.read().records.clone()
    }

    pub fn get(&self, id: ShapeId) -> Option<Arc<ShapeRecord>> {
        let inner = self.read();
        inner.index.get(&id).map(|&i| inner.records[i].clone())
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    pub fn state(&self) -> LoadState {
        self.read().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().pending_ticket.is_some()
    }

    /// Bumped on every replacement of the record set
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// Normalized keyword tokens across all records, in first-seen order
    pub fn categories(&self) -> Vec<String> {
        self.category_options().into_iter().map(|o| o.value).collect()
    }

    /// Category options with the first-seen spelling as label
    pub fn category_options(&self) -> Vec<CategoryOption> {
        let inner = self.read();
        let mut seen = HashSet::new();
        let mut options = Vec::new();

        for record in inner.records.iter() {
            for raw in record.keywords.split(',') {
                let label = raw.trim();
                if label.is_empty() {
                    continue;
                }
                let value = label.to_lowercase();
                if seen.insert(value.clone()) {
                    options.push(CategoryOption {
                        value,
                        label: label.to_string(),
                    });
                }
            }
        }

        options
    }
}
