//! shapehub-core: engine of the shapehub catalog browser
//!
//! This library provides:
//! - Catalog service clients (HTTP and in-memory)
//! - CatalogStore: the fetched record set and its write-once payload caches
//! - Query engine: filtered, sorted views over the catalog
//! - RenderScheduler: batched, non-reentrant card materialization
//! - ShapeCard: payload fetch (single-flight per record) and export
//! - HostBridge: optional export target provided by the desktop shell
//! - Browser: the session container wiring all of the above together

pub mod bridge;
pub mod browser;
pub mod card;
pub mod catalog;
pub mod config;
pub mod debounce;
pub mod error;
pub mod http;
pub mod locale;
pub mod query;
pub mod render;
pub mod service;

pub use bridge::{BridgeStatus, FileBridge, HostBridge, HostExport};
pub use browser::{Browser, BrowserSettings, DisplayState};
pub use card::{CardEvent, ExportOutcome, PayloadFetches, ShapeCard};
pub use catalog::{CatalogStore, CategoryOption, LoadOutcome, LoadState};
pub use config::BrowseConfig;
pub use error::{BridgeError, CatalogError, ConfigError, Result, ShapehubError};
pub use locale::{Locale, Messages};
pub use query::{view, CatalogView, QueryMode, QueryParameters, SortKey};
pub use render::{RenderScheduler, RenderWindow, ScrollMetrics};
pub use service::{CatalogService, HttpCatalogService, MemoryCatalogService, ServiceOp, StencilFile};

pub use shapehub_domain::{Payload, ShapeId, ShapeRecord, StencilRef};
