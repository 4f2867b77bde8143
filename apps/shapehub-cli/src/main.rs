//! shapehub - command-line catalog browser

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shapehub_cli::{commands, Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.resolve_config()?;
    let browser = cli.open_browser(&config)?;

    match cli.command {
        Commands::Browse(args) => commands::browse::execute(args, &browser).await?,
        Commands::Categories => commands::categories::execute(&browser).await?,
        Commands::Export(args) => commands::export::execute(args, &browser).await?,
        Commands::Stencil(args) => commands::stencil::execute(args, &browser).await?,
    }
    Ok(())
}
