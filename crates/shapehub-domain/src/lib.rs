//! Shape catalog domain types
//!
//! This crate provides the canonical models shared by the catalog engine and its frontends:
//! - ShapeRecord: one catalog entry with metadata and a write-once payload cache
//! - StencilRef: the stencil file a shape was uploaded with
//! - Payload: the opaque exportable content of a shape
//! - Wire helpers for the lenient JSON the catalog service produces

pub mod payload;
pub mod shape;
pub mod stencil;
pub mod wire;

pub use payload::*;
pub use shape::*;
pub use stencil::*;
