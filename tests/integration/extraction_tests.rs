use crate::common::*;
use accord_harvest::crawler::{Coordinator, HaltReason, PhaseOutcome};
use accord_harvest::storage::{CandidateUrl, ExtractedItem, SqliteStorage, Storage};
use std::collections::BTreeMap;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Store holding `total` Acme candidates on the mock server, the first `done` extracted
fn seeded_storage(base_url: &str, total: usize, done: usize) -> SqliteStorage {
    let mut storage = SqliteStorage::new_in_memory().unwrap();
    for i in 0..total {
        let url = format!("{}{}", base_url, item_path("Acme", i));
        storage.insert_url(&CandidateUrl::new(&url, "Acme")).unwrap();
        if i < done {
            storage
                .insert_item(&ExtractedItem::new(&url, "Done", "Acme", BTreeMap::new()))
                .unwrap();
        }
    }
    storage
}

#[tokio::test]
async fn test_resumption_fetches_only_remaining_urls() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path_regex("^/perfume/Acme/Item-[234]\\.html$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_page("Fresh")))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/perfume/Acme/Item-[01]\\.html$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let storage = seeded_storage(&base_url, 5, 2);
    let mut coordinator = Coordinator::with_storage(create_test_config(&base_url), storage).unwrap();
    let report = coordinator.extract_items().await.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Done);
    assert_eq!(report.progress.discovered, 3);
    assert_eq!(report.progress.extracted, 3);
    assert_eq!(coordinator.storage().seen_items().unwrap().len(), 5);
    assert_eq!(coordinator.storage().count_remaining().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_heading_stores_unknown_record() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        &item_path("Acme", 0),
        "<html><body><p>Layout changed</p></body></html>".to_string(),
    )
    .await;

    let storage = seeded_storage(&base_url, 1, 0);
    let mut coordinator = Coordinator::with_storage(create_test_config(&base_url), storage).unwrap();
    let report = coordinator.extract_items().await.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Done);
    assert_eq!(report.progress.failed, 0);
    assert_eq!(report.progress.extracted, 1);

    let item = coordinator
        .storage()
        .get_item(&format!("{}{}", base_url, item_path("Acme", 0)))
        .unwrap()
        .expect("Fallback record should be stored");
    assert_eq!(item.name, "Unknown");
    assert_eq!(item.category, "Acme");
    assert!(item.attributes.is_empty());
}

#[tokio::test]
async fn test_failed_item_stays_pending() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_status(&server, &item_path("Acme", 0), 404, 1).await;
    mount_page(&server, &item_path("Acme", 1), item_page("Second")).await;

    let storage = seeded_storage(&base_url, 2, 0);
    let mut coordinator = Coordinator::with_storage(create_test_config(&base_url), storage).unwrap();
    let report = coordinator.extract_items().await.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Done);
    assert_eq!(report.progress.failed, 1);
    assert_eq!(report.progress.extracted, 1);
    assert_eq!(coordinator.storage().count_remaining().unwrap(), 1);
}

#[tokio::test]
async fn test_rate_limit_halts_extraction() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, &item_path("Acme", 0), item_page("First")).await;
    mount_status(&server, &item_path("Acme", 1), 429, 1).await;
    mount_status(&server, &item_path("Acme", 2), 200, 0).await;

    let mut config = create_test_config(&base_url);
    config.crawler.concurrency = 1;

    let storage = seeded_storage(&base_url, 3, 0);
    let mut coordinator = Coordinator::with_storage(config, storage).unwrap();
    let report = coordinator.extract_items().await.unwrap();

    assert_eq!(
        report.outcome,
        PhaseOutcome::Halted(HaltReason::RateLimited)
    );
    assert_eq!(report.progress.extracted, 1);
    assert_eq!(report.progress.failed, 0);
    assert_eq!(coordinator.storage().count_items().unwrap(), 1);
    assert_eq!(coordinator.storage().count_remaining().unwrap(), 2);
}

#[tokio::test]
async fn test_interrupt_before_start_fetches_nothing() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let storage = seeded_storage(&base_url, 2, 0);
    let mut coordinator = Coordinator::with_storage(create_test_config(&base_url), storage).unwrap();
    coordinator.governor().halt(HaltReason::Interrupted);

    let report = coordinator.extract_items().await.unwrap();
    assert_eq!(
        report.outcome,
        PhaseOutcome::Halted(HaltReason::Interrupted)
    );
    assert_eq!(coordinator.storage().count_items().unwrap(), 0);
}
