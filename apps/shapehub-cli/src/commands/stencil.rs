//! Stencil command - download a stencil file.

use std::path::{Path, PathBuf};

use clap::Args;
use shapehub_core::{Browser, CatalogService, Result};

/// Arguments for the stencil command.
#[derive(Debug, Args)]
pub struct StencilArgs {
    /// Stencil ID (shown by `browse`)
    pub stencil_id: u64,

    /// Directory to save into
    #[arg(long, short = 'o', default_value = ".")]
    pub out: PathBuf,
}

/// Execute the stencil command.
pub async fn execute(args: StencilArgs, browser: &Browser) -> Result<()> {
    let stencil = browser.service().download_stencil(args.stencil_id).await?;
    let target = args.out.join(safe_file_name(&stencil.file_name, args.stencil_id));

    std::fs::create_dir_all(&args.out)?;
    std::fs::write(&target, &stencil.bytes)?;
    tracing::info!(bytes = stencil.bytes.len(), "Saved stencil");
    println!("{}", target.display());
    Ok(())
}

/// Final path component of the server-supplied name, so it cannot escape `--out`
fn safe_file_name(name: &str, stencil_id: u64) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("stencil-{}.vssx", stencil_id))
}
