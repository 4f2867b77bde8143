//! Browse session integration tests
//!
//! Drive a [`Browser`] over the in-memory catalog service and check what the
//! service saw alongside what the user would see.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{box_and_circle, browser, fixture_service, numbered};
use shapehub_core::{
    CatalogService, DisplayState, ExportOutcome, FileBridge, HostBridge, Locale, LoadOutcome,
    LoadState, MemoryCatalogService, Payload, QueryParameters, ServiceOp, ShapeId, SortKey,
};

fn view_ids(browser: &shapehub_core::Browser) -> Vec<u64> {
    browser.view().ids().into_iter().map(|id| id.0).collect()
}

// === Paging ===

#[tokio::test]
async fn test_pages_of_ten_until_exhausted() {
    let service = MemoryCatalogService::new(numbered(25));
    let browser = browser(&service, 10);
    browser.start().await.unwrap();

    // start() materializes the first page
    assert_eq!(browser.cards().len(), 10);
    assert_eq!(browser.advance().len(), 10);
    assert_eq!(browser.advance().len(), 5);
    assert!(browser.advance().is_empty());
    assert!(browser.advance().is_empty());
    assert_eq!(browser.window().cursor(), 25);

    let materialized: Vec<u64> = browser.cards().iter().map(|c| c.record().id.0).collect();
    assert_eq!(materialized, (1..=25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_query_change_resets_window() {
    let service = MemoryCatalogService::new(numbered(25));
    let browser = browser(&service, 10);
    browser.start().await.unwrap();
    browser.advance();
    assert_eq!(browser.window().cursor(), 20);

    browser.set_category("network").await.unwrap();
    let matched = browser.view().len();
    assert_eq!(browser.window().cursor(), matched.min(10));
    assert!(browser
        .cards()
        .iter()
        .all(|c| c.record().keywords == "network"));
}

// === Payload fetch and export ===

#[tokio::test(start_paused = true)]
async fn test_two_exports_share_one_request() {
    let service = fixture_service();
    service.set_latency(Some(Duration::from_millis(30)));
    let browser = browser(&service, 10);
    browser.start().await.unwrap();
    service.clear_operations();

    let card = browser.card(ShapeId(2)).unwrap();
    let (first, second) = tokio::join!(card.payload(), card.payload());
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(first.ptr_eq(&second));
    assert_eq!(first.as_str(), "<Shape Name='Circle'/>");
    assert_eq!(
        service.operations(),
        vec![ServiceOp::FetchPayload { id: ShapeId(2) }]
    );

    // The store learns about the payload through the card's notification
    assert_eq!(browser.process_events(), 1);
    assert!(browser.store().get(ShapeId(2)).unwrap().has_payload());

    // Cached now: no further request
    card.export().await;
    assert_eq!(service.payload_fetch_count(ShapeId(2)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_two_card_handles_share_one_request() {
    let service = fixture_service();
    let browser = browser(&service, 1);
    browser.start().await.unwrap();
    service.clear_operations();
    service.set_latency(Some(Duration::from_millis(30)));

    // id 2 is past the first page, so each lookup builds a new card
    let first = browser.card(ShapeId(2)).unwrap();
    let second = browser.card(ShapeId(2)).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    let (a, b) = tokio::join!(first.export(), second.export());
    assert_eq!(a, ExportOutcome::HostUnavailable);
    assert_eq!(b, ExportOutcome::HostUnavailable);
    assert_eq!(service.payload_fetch_count(ShapeId(2)), 1);
    assert_eq!(browser.process_events(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_payload_fetch_spans_query_change() {
    let service = fixture_service();
    let browser = browser(&service, 10);
    browser.start().await.unwrap();
    service.clear_operations();
    service.set_latency(Some(Duration::from_millis(30)));

    let card = browser.card(ShapeId(2)).unwrap();
    let (before, after) = tokio::join!(card.payload(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        browser.set_search_text("circle").await.unwrap();

        let rebuilt = browser.cards().remove(0);
        assert_eq!(rebuilt.record().id, ShapeId(2));
        assert!(!Arc::ptr_eq(&rebuilt, &card));
        assert!(rebuilt.is_fetching());
        rebuilt.payload().await
    });

    assert!(before.unwrap().ptr_eq(&after.unwrap()));
    assert_eq!(
        service.operations(),
        vec![ServiceOp::FetchPayload { id: ShapeId(2) }]
    );
}

#[tokio::test]
async fn test_failed_fetch_leaves_cache_empty() {
    let service = fixture_service();
    let browser = browser(&service, 10);
    browser.start().await.unwrap();
    service.fail_payload(ShapeId(1), true);

    let card = browser.card(ShapeId(1)).unwrap();
    assert_eq!(card.export().await, ExportOutcome::FetchFailed);
    assert!(!card.record().has_payload());
    assert_eq!(browser.process_events(), 0);

    service.fail_payload(ShapeId(1), false);
    assert_eq!(card.export().await, ExportOutcome::HostUnavailable);
    assert!(card.record().has_payload());
}

#[tokio::test]
async fn test_export_through_file_bridge() {
    let endpoint = tempfile::NamedTempFile::new().unwrap();
    let service = fixture_service();
    let browser = shapehub_core::Browser::new(
        Arc::new(service.clone()),
        HostBridge::Present(Arc::new(FileBridge::new(endpoint.path()))),
        Default::default(),
    );
    browser.start().await.unwrap();

    let card = browser.card(ShapeId(3)).unwrap();
    assert_eq!(card.export().await, ExportOutcome::Exported);

    let written = std::fs::read_to_string(endpoint.path()).unwrap();
    let message: serde_json::Value = serde_json::from_str(written.trim()).unwrap();
    assert_eq!(message["command"], "DragDropShape");
    assert_eq!(message["payload"], "<Shape Name='Server Rack'/>");
}

#[tokio::test]
async fn test_merge_payload_first_write_wins() {
    let service = MemoryCatalogService::new(box_and_circle());
    let browser = browser(&service, 10);
    browser.start().await.unwrap();

    let store = browser.store();
    assert!(store.merge_payload(ShapeId(1), Payload::from("first")));
    assert!(!store.merge_payload(ShapeId(1), Payload::from("second")));
    assert_eq!(
        store.get(ShapeId(1)).unwrap().payload().map(Payload::as_str),
        Some("first")
    );
}

// === Service-ranked sort ===

#[tokio::test]
async fn test_switch_to_popular_reloads_first() {
    let service = MemoryCatalogService::new(box_and_circle());
    let browser = browser(&service, 10);
    browser.start().await.unwrap();
    browser.set_sort_key(SortKey::RatingDesc).await.unwrap();
    assert_eq!(view_ids(&browser), vec![2, 1]);
    assert_eq!(service.listing_count(), 1);

    browser.set_sort_key(SortKey::Popular).await.unwrap();
    assert_eq!(service.listing_count(), 2);
    assert_eq!(
        service.operations().last(),
        Some(&ServiceOp::ListShapes {
            sort: Some("popular".to_string())
        })
    );
    assert_eq!(view_ids(&browser), vec![1, 2]);

    // Leaving popular, or filtering under it, is local
    browser.set_search_text("o").await.unwrap();
    browser.set_sort_key(SortKey::DateDesc).await.unwrap();
    assert_eq!(service.listing_count(), 2);
}

#[tokio::test]
async fn test_failed_popular_reload_keeps_view() {
    let service = MemoryCatalogService::new(box_and_circle());
    let browser = browser(&service, 10);
    browser.start().await.unwrap();
    browser.set_sort_key(SortKey::RatingDesc).await.unwrap();
    let before = view_ids(&browser);

    service.fail_listing(Some("maintenance"));
    assert!(browser.set_sort_key(SortKey::Popular).await.is_err());

    assert_eq!(view_ids(&browser), before);
    assert_eq!(browser.cards().len(), 2);
    assert_eq!(browser.query().sort_key, SortKey::Popular);
    assert_eq!(
        browser.display_state(),
        DisplayState::Failed(Locale::En.messages().load_error.to_string())
    );

    // Manual reload is the recovery path
    service.fail_listing(None);
    let outcome = browser.reload().await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Applied { count: 2, .. }));
    assert_eq!(browser.display_state(), DisplayState::Cards(2));
    assert_eq!(view_ids(&browser), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_query_change_discards_inflight_reload() {
    let service = MemoryCatalogService::new(box_and_circle());
    let browser = browser(&service, 10);
    browser.start().await.unwrap();
    browser.set_sort_key(SortKey::RatingAsc).await.unwrap();

    // The popular listing would rank Box first and drop Circle
    service.set_shapes(vec![box_and_circle().remove(0)]);
    service.set_latency(Some(Duration::from_millis(100)));

    let (popular, _) = tokio::join!(browser.set_sort_key(SortKey::Popular), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        browser.set_sort_key(SortKey::DateDesc).await.unwrap();
    });
    popular.unwrap();

    // The reload ran, but its result never reached the store or the view
    assert_eq!(service.listing_count(), 2);
    assert_eq!(browser.store().len(), 2);
    assert_eq!(browser.store().state(), LoadState::Ready);
    assert_eq!(browser.query().sort_key, SortKey::DateDesc);
    assert_eq!(browser.view().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_search_during_first_load_keeps_load() {
    let service = MemoryCatalogService::new(box_and_circle());
    service.set_latency(Some(Duration::from_millis(100)));
    let browser = browser(&service, 10);

    let (started, _) = tokio::join!(browser.start(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        browser.set_search_text("box").await.unwrap();
        assert!(matches!(browser.display_state(), DisplayState::Loading(_)));
    });

    // The load lands and the view follows the search typed meanwhile
    assert!(matches!(started.unwrap(), LoadOutcome::Applied { count: 2, .. }));
    assert_eq!(browser.store().len(), 2);
    assert_eq!(browser.store().state(), LoadState::Ready);
    assert_eq!(view_ids(&browser), vec![1]);
    assert_eq!(browser.display_state(), DisplayState::Cards(1));
    assert_eq!(service.listing_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_filter_change_during_popular_reload() {
    let service = MemoryCatalogService::new(box_and_circle());
    let browser = browser(&service, 10);
    browser.start().await.unwrap();

    service.set_shapes(vec![box_and_circle().remove(0)]);
    service.set_latency(Some(Duration::from_millis(100)));

    let (popular, _) = tokio::join!(browser.set_sort_key(SortKey::Popular), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        browser.set_search_text("o").await.unwrap();
    });
    popular.unwrap();

    // Same sort, so the popular listing is kept and filtered by the new search
    assert_eq!(service.listing_count(), 2);
    assert_eq!(browser.store().len(), 1);
    assert_eq!(browser.store().state(), LoadState::Ready);
    assert_eq!(
        browser.query(),
        QueryParameters::default()
            .with_sort(SortKey::Popular)
            .with_search("o")
    );
    assert_eq!(view_ids(&browser), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_sort_change_during_first_popular_load_reloads() {
    let service = MemoryCatalogService::new(box_and_circle());
    service.set_latency(Some(Duration::from_millis(100)));
    let browser = browser(&service, 10);

    let (popular, date) = tokio::join!(browser.set_sort_key(SortKey::Popular), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        browser.set_sort_key(SortKey::DateDesc).await
    });
    popular.unwrap();
    date.unwrap();

    assert_eq!(service.listing_count(), 2);
    assert_eq!(
        service.operations().last(),
        Some(&ServiceOp::ListShapes {
            sort: Some("date-desc".to_string())
        })
    );
    assert_eq!(browser.store().state(), LoadState::Ready);
    assert_eq!(browser.display_state(), DisplayState::Cards(2));
}

// === Search input ===

#[tokio::test(start_paused = true)]
async fn test_search_input_is_debounced() {
    let service = MemoryCatalogService::new(box_and_circle());
    let browser = browser(&service, 10);
    browser.start().await.unwrap();

    let (b, bo, box_) = tokio::join!(
        browser.search_input("b"),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            browser.search_input("bo").await
        },
        async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            browser.search_input("box").await
        },
    );

    assert!(!b.unwrap());
    assert!(!bo.unwrap());
    assert!(box_.unwrap());
    assert_eq!(browser.query(), QueryParameters::default().with_search("box"));
    assert_eq!(view_ids(&browser), vec![1]);
}

// === Categories and stencils ===

#[tokio::test]
async fn test_category_options_from_fixture() {
    let service = fixture_service();
    let browser = browser(&service, 10);
    browser.start().await.unwrap();

    assert_eq!(
        browser.categories(),
        vec!["square", "basic", "round", "network", "datacenter"]
    );
    let labels: Vec<String> = browser
        .category_options()
        .into_iter()
        .map(|o| o.label)
        .collect();
    assert_eq!(labels[3], "Network");
}

#[tokio::test]
async fn test_stencil_download() {
    let service = fixture_service();
    let stencil = service.download_stencil(4).await.unwrap();
    assert_eq!(stencil.file_name, "basic.vssx");
    assert_eq!(stencil.bytes, b"PK-stencil".to_vec());
}

#[tokio::test]
async fn test_failed_first_load_shows_error() {
    let service = MemoryCatalogService::new(box_and_circle());
    service.fail_listing(Some("down"));
    let browser = browser(&service, 10);

    assert!(browser.start().await.is_err());
    assert!(matches!(browser.display_state(), DisplayState::Failed(_)));
    assert!(browser.view().is_empty());
}
