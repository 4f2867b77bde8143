//! Catalog service clients
//!
//! The catalog service exposes three read endpoints:
//! - `GET /get_shapes[?sort=<key>]`: every shape as a JSON array
//! - `GET /get_shape/<id>`: the payload of one shape
//! - `GET /download_stencil/<stencil_id>`: a stencil file
//!
//! [`HttpCatalogService`] talks to a live deployment; [`MemoryCatalogService`]
//! serves a JSON document from memory and records every request.

pub mod http;
pub mod memory;

pub use self::http::*;
pub use memory::*;

use async_trait::async_trait;
use shapehub_domain::{Payload, ShapeId, ShapeRecord};

use crate::error::CatalogError;

/// A downloaded stencil file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StencilFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Read access to the shape catalog
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// List every shape. `sort` is forwarded as the `sort` query parameter;
    /// the service only ranks server-side for `popular`.
    async fn list_shapes(&self, sort: Option<&str>) -> Result<Vec<ShapeRecord>, CatalogError>;

    /// Fetch the payload of one shape
    async fn fetch_payload(&self, id: ShapeId) -> Result<Payload, CatalogError>;

    /// Download the stencil file a shape belongs to
    async fn download_stencil(&self, stencil_id: u64) -> Result<StencilFile, CatalogError>;
}
