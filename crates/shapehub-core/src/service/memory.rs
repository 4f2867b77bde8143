//! In-memory catalog service with request tracing.
//!
//! Serves a catalog document without a network and records every request for
//! later assertion. Failures and latency can be injected per endpoint.
//!
//! The document is either a bare JSON array of shapes or an object:
//!
//! ```json
//! {
//!   "shapes": [{ "id": 1, "name": "Box", "keywords": "square,basic" }],
//!   "payloads": { "1": "<Shape .../>" },
//!   "stencils": { "4": { "file_name": "basic.vssx", "content": "..." } }
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shapehub_domain::{Payload, ShapeId, ShapeRecord};

use super::{CatalogService, StencilFile};
use crate::error::CatalogError;

/// Record of a service request for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOp {
    /// Catalog listing with the sort parameter that was sent
    ListShapes { sort: Option<String> },
    /// Payload fetch for one shape
    FetchPayload { id: ShapeId },
    /// Stencil download
    DownloadStencil { stencil_id: u64 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Listing(Vec<ShapeRecord>),
    Full {
        shapes: Vec<ShapeRecord>,
        #[serde(default)]
        payloads: HashMap<String, String>,
        #[serde(default)]
        stencils: HashMap<String, StencilEntry>,
    },
}

#[derive(Deserialize)]
struct StencilEntry {
    file_name: String,
    #[serde(default)]
    content: String,
}

fn parse_key(key: &str) -> Result<u64, CatalogError> {
    key.trim()
        .parse()
        .map_err(|_| CatalogError::Decode(format!("invalid id key: {}", key)))
}

#[derive(Default)]
struct Faults {
    listing: Option<String>,
    payloads: HashSet<ShapeId>,
    latency: Option<Duration>,
}

/// In-memory catalog service.
#[derive(Clone, Default)]
pub struct MemoryCatalogService {
    shapes: Arc<Mutex<Vec<ShapeRecord>>>,
    payloads: Arc<Mutex<HashMap<ShapeId, Payload>>>,
    stencils: Arc<Mutex<HashMap<u64, StencilFile>>>,
    operations: Arc<Mutex<Vec<ServiceOp>>>,
    faults: Arc<Mutex<Faults>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not cascade into unrelated assertions.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryCatalogService {
    pub fn new(shapes: Vec<ShapeRecord>) -> Self {
        let service = Self::default();
        *lock(&service.shapes) = shapes;
        service
    }

    /// Build from a catalog document (see module docs)
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let service = match serde_json::from_str(json)? {
            CatalogDocument::Listing(shapes) => Self::new(shapes),
            CatalogDocument::Full {
                shapes,
                payloads,
                stencils,
            } => {
                let service = Self::new(shapes);
                for (id, data) in payloads {
                    service.insert_payload(ShapeId(parse_key(&id)?), data);
                }
                for (stencil_id, entry) in stencils {
                    service.insert_stencil(
                        parse_key(&stencil_id)?,
                        entry.file_name,
                        entry.content.into_bytes(),
                    );
                }
                service
            }
        };
        Ok(service)
    }

    /// Load a catalog document from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Builder method to attach a payload
    pub fn with_payload(self, id: impl Into<ShapeId>, data: impl Into<Payload>) -> Self {
        self.insert_payload(id.into(), data);
        self
    }

    pub fn insert_payload(&self, id: ShapeId, data: impl Into<Payload>) {
        lock(&self.payloads).insert(id, data.into());
    }

    pub fn insert_stencil(&self, stencil_id: u64, file_name: impl Into<String>, bytes: Vec<u8>) {
        lock(&self.stencils).insert(
            stencil_id,
            StencilFile {
                file_name: file_name.into(),
                bytes,
            },
        );
    }

    /// Replace the served catalog (e.g. to simulate new uploads)
    pub fn set_shapes(&self, shapes: Vec<ShapeRecord>) {
        *lock(&self.shapes) = shapes;
    }

    /// Make every listing fail with `message` until cleared with `None`
    pub fn fail_listing(&self, message: Option<&str>) {
        lock(&self.faults).listing = message.map(str::to_string);
    }

    /// Make payload fetches for `id` fail (or succeed again)
    pub fn fail_payload(&self, id: ShapeId, fail: bool) {
        let mut faults = lock(&self.faults);
        if fail {
            faults.payloads.insert(id);
        } else {
            faults.payloads.remove(&id);
        }
    }

    /// Delay every request by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        lock(&self.faults).latency = latency;
    }

    /// Every request served so far, in order
    pub fn operations(&self) -> Vec<ServiceOp> {
        lock(&self.operations).clone()
    }

    pub fn listing_count(&self) -> usize {
        lock(&self.operations)
            .iter()
            .filter(|op| matches!(op, ServiceOp::ListShapes { .. }))
            .count()
    }

    pub fn payload_fetch_count(&self, id: ShapeId) -> usize {
        lock(&self.operations)
            .iter()
            .filter(|op| matches!(op, ServiceOp::FetchPayload { id: fetched } if *fetched == id))
            .count()
    }

    pub fn clear_operations(&self) {
        lock(&self.operations).clear();
    }

    async fn record(&self, op: ServiceOp) {
        lock(&self.operations).push(op);
        let latency = lock(&self.faults).latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CatalogService for MemoryCatalogService {
    async fn list_shapes(&self, sort: Option<&str>) -> Result<Vec<ShapeRecord>, CatalogError> {
        self.record(ServiceOp::ListShapes {
            sort: sort.map(str::to_string),
        })
        .await;

        if let Some(message) = lock(&self.faults).listing.clone() {
            return Err(CatalogError::Unavailable(message));
        }

        // Fresh copies: a listing never carries client-side payload caches.
        let mut shapes: Vec<ShapeRecord> = lock(&self.shapes)
            .iter()
            .map(ShapeRecord::detached)
            .collect();
        if sort == Some("popular") {
            shapes.sort_by(|a, b| b.download_count.cmp(&a.download_count));
        }
        Ok(shapes)
    }

    async fn fetch_payload(&self, id: ShapeId) -> Result<Payload, CatalogError> {
        self.record(ServiceOp::FetchPayload { id }).await;

        if lock(&self.faults).payloads.contains(&id) {
            return Err(CatalogError::Unavailable(format!("payload {}", id)));
        }

        lock(&self.payloads)
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("shape {}", id)))
    }

    async fn download_stencil(&self, stencil_id: u64) -> Result<StencilFile, CatalogError> {
        self.record(ServiceOp::DownloadStencil { stencil_id }).await;

        lock(&self.stencils)
            .get(&stencil_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("stencil {}", stencil_id)))
    }
}
