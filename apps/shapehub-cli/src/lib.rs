//! shapehub CLI
//!
//! Browse the shape catalog from a terminal.
//!
//! ## Commands
//!
//! - `shapehub browse` - list shapes matching a query, page by page
//! - `shapehub categories` - list the category filter options
//! - `shapehub export <ID>` - hand a shape's payload to the host bridge
//! - `shapehub stencil <STENCIL_ID>` - download a stencil file
//!
//! ## Configuration
//!
//! Settings come from `config.toml` in the shapehub config directory, then
//! `SHAPEHUB_BASE_URL` / `SHAPEHUB_LOCALE`, then the flags below.
//! `--catalog-file` browses a local JSON catalog instead of a live service.

pub mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use shapehub_core::{
    BrowseConfig, Browser, BrowserSettings, ConfigError, HostBridge, Locale,
    MemoryCatalogService,
};

/// shapehub - shape catalog browser
#[derive(Debug, Parser)]
#[command(name = "shapehub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog service URL
    #[arg(long, global = true, conflicts_with = "catalog_file")]
    pub base_url: Option<String>,

    /// Browse a local JSON catalog instead of the service
    #[arg(long, global = true)]
    pub catalog_file: Option<PathBuf>,

    /// Message language (en, de)
    #[arg(long, global = true)]
    pub locale: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List shapes matching a query
    Browse(commands::browse::BrowseArgs),
    /// List category filter options
    Categories,
    /// Export a shape's payload to the host bridge
    Export(commands::export::ExportArgs),
    /// Download a stencil file
    Stencil(commands::stencil::StencilArgs),
}

impl Cli {
    /// Effective configuration: file, then environment, then flags
    pub fn resolve_config(&self) -> Result<BrowseConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = BrowseConfig::load(path)?;
                config.apply_env_from(|key| std::env::var(key).ok())?;
                config
            }
            None => BrowseConfig::load_default()?,
        };
        self.apply_flags(&mut config)?;
        Ok(config)
    }

    fn apply_flags(&self, config: &mut BrowseConfig) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(tag) = &self.locale {
            config.locale = Locale::parse(tag).ok_or_else(|| ConfigError::InvalidValue {
                field: "--locale".to_string(),
                value: tag.clone(),
            })?;
        }
        Ok(())
    }

    /// Open a browse session on the configured catalog
    pub fn open_browser(&self, config: &BrowseConfig) -> shapehub_core::Result<Browser> {
        match &self.catalog_file {
            Some(path) => {
                let service = MemoryCatalogService::from_file(path)?;
                let bridge = match &config.host_bridge_path {
                    Some(path) => HostBridge::probe(Some(path.clone())),
                    None => HostBridge::detect(),
                };
                Ok(Browser::new(Arc::new(service), bridge, BrowserSettings::from(config)))
            }
            None => Browser::from_config(config),
        }
    }
}
