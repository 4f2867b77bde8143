//! Categories command - list category filter options.

use comfy_table::Table;
use shapehub_core::{Browser, Result};

/// Execute the categories command.
pub async fn execute(browser: &Browser) -> Result<()> {
    browser.start().await?;

    let options = browser.category_options();
    if options.is_empty() {
        println!("{}", browser.messages().empty);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Filter value"]);
    for option in options {
        table.add_row(vec![option.label, option.value]);
    }
    println!("{table}");
    Ok(())
}
