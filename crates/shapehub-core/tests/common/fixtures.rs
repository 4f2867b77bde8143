//! Test fixtures shared by the integration tests

use std::path::PathBuf;
use std::sync::Arc;

use shapehub_core::{Browser, BrowserSettings, HostBridge, MemoryCatalogService, ShapeRecord};

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// The catalog document most tests browse
#[allow(dead_code)]
pub fn fixture_service() -> MemoryCatalogService {
    MemoryCatalogService::from_file(fixture_path("catalog.json"))
        .unwrap_or_else(|e| panic!("Failed to load catalog fixture: {}", e))
}

/// The two-record catalog used throughout the query examples
#[allow(dead_code)]
pub fn box_and_circle() -> Vec<ShapeRecord> {
    vec![
        ShapeRecord::new(1, "Box", "square,basic")
            .with_rating(4.0)
            .with_downloads(10)
            .with_uploader("7", "alice"),
        ShapeRecord::new(2, "Circle", "round,basic")
            .with_rating(5.0)
            .with_downloads(2)
            .with_uploader("8", "bob"),
    ]
}

/// `count` numbered records, keywords cycling through a few categories
#[allow(dead_code)]
pub fn numbered(count: u64) -> Vec<ShapeRecord> {
    const CATEGORIES: [&str; 3] = ["basic", "network", "flow"];
    (1..=count)
        .map(|i| {
            ShapeRecord::new(i, format!("Shape {}", i), CATEGORIES[(i % 3) as usize])
                .with_downloads(i % 5)
                .with_uploader((i % 4).to_string(), format!("user{}", i % 4))
        })
        .collect()
}

/// Browser over `service` without a host bridge
#[allow(dead_code)]
pub fn browser(service: &MemoryCatalogService, page_size: usize) -> Browser {
    let settings = BrowserSettings {
        page_size,
        ..BrowserSettings::default()
    };
    Browser::new(Arc::new(service.clone()), HostBridge::Absent, settings)
}
