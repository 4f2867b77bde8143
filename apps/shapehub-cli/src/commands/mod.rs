//! Subcommand implementations

pub mod browse;
pub mod categories;
pub mod export;
pub mod stencil;
