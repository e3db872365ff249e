use crate::common::*;
use accord_harvest::config::StoreConfig;
use accord_harvest::crawler::{Coordinator, HaltReason, PhaseOutcome};
use accord_harvest::storage::{CandidateUrl, SqliteStorage, Storage};
use accord_harvest::HarvestError;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_run_discovers_and_extracts() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/designers/", index_page(&["Acme", "Zeta"])).await;
    mount_page(&server, "/designers/Acme.html", category_page("Acme", 2)).await;
    mount_page(&server, "/designers/Zeta.html", category_page("Zeta", 2)).await;
    for category in ["Acme", "Zeta"] {
        for i in 0..2 {
            mount_page(
                &server,
                &item_path(category, i),
                item_page(&format!("{} Item {}", category, i)),
            )
            .await;
        }
    }

    let mut coordinator =
        Coordinator::new(create_test_config(&base_url)).expect("Failed to create coordinator");
    let reports = coordinator.run_all(false).await.expect("Run failed");

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.outcome == PhaseOutcome::Done));
    assert_eq!(reports[0].progress.discovered, 4);
    assert_eq!(reports[1].progress.extracted, 4);
    assert_eq!(reports[1].progress.failed, 0);

    let storage = coordinator.storage();
    assert_eq!(storage.count_urls().unwrap(), 4);
    assert_eq!(storage.count_items().unwrap(), 4);
    assert_eq!(storage.count_remaining().unwrap(), 0);

    let item = storage
        .get_item(&format!("{}{}", base_url, item_path("Acme", 1)))
        .unwrap()
        .expect("Item should be stored");
    assert_eq!(item.name, "Acme Item 1");
    assert_eq!(item.category, "Acme");
    assert_eq!(item.attributes.get("woody"), Some(&100.0));
    assert_eq!(item.attributes.get("amber"), Some(&64.2));
}

#[tokio::test]
async fn test_exhausted_category_is_never_fetched() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/designers/", index_page(&["Acme", "Zeta"])).await;
    mount_status(&server, "/designers/Acme.html", 200, 0).await;
    mount_page(&server, "/designers/Zeta.html", category_page("Zeta", 1)).await;

    let mut config = create_test_config(&base_url);
    config.crawler.per_category_cap = 2;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    for i in 0..2 {
        let url = format!("{}{}", base_url, item_path("Acme", i));
        storage.insert_url(&CandidateUrl::new(&url, "Acme")).unwrap();
    }

    let mut coordinator = Coordinator::with_storage(config, storage).unwrap();
    let report = coordinator.discover_urls(false).await.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Done);
    assert_eq!(report.progress.skipped_exhausted, 1);
    assert_eq!(report.progress.fetched, 1);
    assert_eq!(report.progress.discovered, 1);
    assert_eq!(coordinator.storage().count_urls().unwrap(), 3);
}

#[tokio::test]
async fn test_rate_limit_halts_and_keeps_earlier_records() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/designers/", index_page(&["Acme", "Zeta", "Omega"])).await;
    mount_page(&server, "/designers/Acme.html", category_page("Acme", 3)).await;
    mount_status(&server, "/designers/Zeta.html", 429, 1).await;
    mount_status(&server, "/designers/Omega.html", 200, 0).await;

    // Extraction must not start after a halted discovery
    Mock::given(method("GET"))
        .and(path_regex("^/perfume/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&base_url);
    config.crawler.concurrency = 1;

    let mut coordinator = Coordinator::new(config).unwrap();
    let reports = coordinator.run_all(false).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].outcome,
        PhaseOutcome::Halted(HaltReason::RateLimited)
    );
    assert_eq!(reports[0].progress.failed, 0);
    assert_eq!(coordinator.storage().count_urls().unwrap(), 3);
}

#[tokio::test]
async fn test_failed_category_is_counted_and_phase_continues() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/designers/", index_page(&["Acme", "Zeta"])).await;
    mount_status(&server, "/designers/Acme.html", 503, 1).await;
    mount_page(&server, "/designers/Zeta.html", category_page("Zeta", 2)).await;

    let mut coordinator = Coordinator::new(create_test_config(&base_url)).unwrap();
    let report = coordinator.discover_urls(false).await.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Done);
    assert_eq!(report.progress.failed, 1);
    assert_eq!(report.progress.fetched, 1);
    assert_eq!(coordinator.storage().count_urls().unwrap(), 2);
}

#[tokio::test]
async fn test_index_failure_is_an_error() {
    let server = MockServer::start().await;
    mount_status(&server, "/designers/", 404, 1).await;

    let mut coordinator = Coordinator::new(create_test_config(&server.uri())).unwrap();
    let result = coordinator.discover_urls(false).await;

    assert!(matches!(result, Err(HarvestError::IndexUnavailable { .. })));
}

#[tokio::test]
async fn test_unusable_store_is_fatal_before_any_fetch() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // A regular file where the store directory should be
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let mut config = create_test_config(&base_url);
    config.store = StoreConfig {
        connection: blocker.path().to_string_lossy().to_string(),
        database: "harvest".to_string(),
    };

    assert!(Coordinator::new(config).is_err());
}

#[tokio::test]
async fn test_rerun_discovery_adds_nothing_new() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/designers/", index_page(&["Acme"])).await;
    mount_page(&server, "/designers/Acme.html", category_page("Acme", 3)).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&base_url);
    config.store = StoreConfig {
        connection: dir.path().to_string_lossy().to_string(),
        database: "harvest".to_string(),
    };

    let first = Coordinator::new(config.clone())
        .unwrap()
        .discover_urls(false)
        .await
        .unwrap();
    assert_eq!(first.progress.discovered, 3);

    let mut coordinator = Coordinator::new(config).unwrap();
    let second = coordinator.discover_urls(false).await.unwrap();

    assert_eq!(second.outcome, PhaseOutcome::Done);
    assert_eq!(second.progress.discovered, 0);
    assert_eq!(second.progress.skipped_duplicate, 3);
    assert_eq!(coordinator.storage().count_urls().unwrap(), 3);
}

#[tokio::test]
async fn test_fresh_discovery_revisits_exhausted_categories() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/designers/", index_page(&["Acme"])).await;
    Mock::given(method("GET"))
        .and(path_regex("^/designers/Acme.html$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(category_page("Acme", 2)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&base_url);
    config.crawler.per_category_cap = 2;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    for i in 0..2 {
        let url = format!("{}{}", base_url, item_path("Acme", i));
        storage.insert_url(&CandidateUrl::new(&url, "Acme")).unwrap();
    }

    let mut coordinator = Coordinator::with_storage(config, storage).unwrap();
    let report = coordinator.discover_urls(true).await.unwrap();

    // Everything is re-offered; the store rejects the duplicates
    assert_eq!(report.progress.skipped_exhausted, 0);
    assert_eq!(report.progress.discovered, 0);
    assert_eq!(report.progress.skipped_duplicate, 2);
}
