//! Browse command - list shapes page by page.

use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};
use shapehub_core::{Browser, DisplayState, LoadState, Locale, QueryParameters, Result, ShapeCard, SortKey};

/// Arguments for the browse command.
#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Case-insensitive text in the name or keywords
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// Category (keyword) filter
    #[arg(long, short = 'c', default_value = "")]
    pub category: String,

    /// Sort order: rating-asc, rating-desc, date-asc, date-desc, popular
    #[arg(long, default_value = "")]
    pub sort: String,

    /// Only shapes uploaded by this user ID
    #[arg(long, short = 'u', default_value = "")]
    pub user: String,

    /// Number of pages to show
    #[arg(long, short = 'p', default_value = "1")]
    pub pages: usize,
}

impl BrowseArgs {
    pub fn query(&self) -> QueryParameters {
        QueryParameters::default()
            .with_search(self.search.as_str())
            .with_category(self.category.as_str())
            .with_sort(SortKey::parse(&self.sort))
            .with_user(self.user.as_str())
    }
}

/// Execute the browse command.
pub async fn execute(args: BrowseArgs, browser: &Browser) -> Result<()> {
    // A failed load still leaves a display state to print below.
    // A service-ranked sort loads the catalog itself; otherwise load here.
    if let Err(e) = browser.set_query(args.query()).await {
        tracing::warn!("Failed to apply query: {}", e);
    }
    if browser.store().state() == LoadState::Idle {
        if let Err(e) = browser.start().await {
            tracing::warn!("Failed to load catalog: {}", e);
        }
    }

    for _ in 1..args.pages {
        if browser.advance().is_empty() {
            break;
        }
    }

    match browser.display_state() {
        DisplayState::Cards(total) => {
            let cards = browser.cards();
            println!("{}", render_table(&cards, browser.settings().locale));
            println!("Showing {} of {}", cards.len(), total);
        }
        DisplayState::Empty(message)
        | DisplayState::Failed(message)
        | DisplayState::Loading(message) => println!("{message}"),
    }
    Ok(())
}

fn render_table(cards: &[std::sync::Arc<ShapeCard>], locale: Locale) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "ID", "Name", "Keywords", "Uploader", "Uploaded", "Downloads", "Rating", "Stencil",
    ]);

    for card in cards {
        let record = card.record();
        table.add_row(vec![
            record.id.to_string(),
            record.name.clone(),
            record.keywords.clone(),
            record.display_uploader().to_string(),
            record
                .upload_date
                .map(|d| locale.format_date(&d))
                .unwrap_or_default(),
            record.download_count.to_string(),
            record.rating.map(|r| format!("{:.1}", r)).unwrap_or_default(),
            record
                .stencil
                .as_ref()
                .map(|s| s.stencil_id.to_string())
                .unwrap_or_default(),
        ]);
    }
    table
}
