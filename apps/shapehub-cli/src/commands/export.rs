//! Export command - hand a shape's payload to the host bridge.

use clap::Args;
use shapehub_core::{Browser, CatalogError, ExportOutcome, Result, ShapeId};

/// Arguments for the export command.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Shape ID
    pub id: u64,
}

/// Execute the export command.
pub async fn execute(args: ExportArgs, browser: &Browser) -> Result<()> {
    browser.start().await?;

    let id = ShapeId(args.id);
    let card = browser
        .card(id)
        .ok_or_else(|| CatalogError::NotFound(format!("shape {}", id)))?;

    let outcome = card.export().await;
    browser.process_events();

    match outcome {
        ExportOutcome::Exported => println!("Exported \"{}\"", card.record().name),
        ExportOutcome::HostUnavailable => {
            println!("No host bridge available; \"{}\" was not exported", card.record().name)
        }
        ExportOutcome::HostFailed => println!("Host bridge failed; see log for details"),
        ExportOutcome::FetchFailed => println!("Could not fetch \"{}\"", card.record().name),
    }
    Ok(())
}
