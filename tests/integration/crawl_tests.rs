//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small parts catalog and run the full
//! make → category → model → part walk end-to-end.

use parts_crawler::config::{
    load_config_with_hash, CatalogConfig, Config, CrawlerConfig, OutputConfig, SelectorConfig,
    UserAgentConfig,
};
use parts_crawler::crawler::{crawl, Coordinator, CLOSE_FINISHED};
use parts_crawler::storage::{
    Pagination, ProductFilter, RunStatus, SqliteStorage, Storage, StoredProduct,
};
use parts_crawler::CrawlerState;
use std::io::Write;
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from the mock server root
fn create_test_config(base_url: &str, db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            concurrent_requests: 4,
            request_timeout: 5_000,
            start_delay_min: 0,
            start_delay_max: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        catalog: CatalogConfig {
            start_urls: vec![format!("{}/", base_url)],
            allowed_domains: vec![],
        },
        selectors: SelectorConfig::default(),
        output: OutputConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            summary_path: "./test_summary.md".to_string(),
        },
    }
}

fn db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("catalog.db")
}

/// Serves `body` as an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

/// A listing page with one `<li><a>` entry per (label, href)
fn listing(class: &str, entries: &[(&str, &str)]) -> String {
    let items: String = entries
        .iter()
        .map(|(label, href)| format!(r#"<li><a href="{}">{}</a></li>"#, href, label))
        .collect();
    format!(
        r#"<html><body><div class="{}"><ul>{}</ul></div></body></html>"#,
        class, items
    )
}

/// A model page listing raw part entries
fn parts_page(entries: &[&str]) -> String {
    let items: String = entries
        .iter()
        .enumerate()
        .map(|(i, inner)| format!(r#"<li><a href="/part/{}">{}</a></li>"#, i, inner))
        .collect();
    format!(
        r#"<html><body><div class="allparts"><ul>{}</ul></div></body></html>"#,
        items
    )
}

fn all_products(db: &Path) -> Vec<StoredProduct> {
    let storage = SqliteStorage::new(db).unwrap();
    storage
        .query_products(&ProductFilter::default(), &Pagination::new(1, 100).unwrap())
        .unwrap()
        .items
}

#[tokio::test]
async fn test_full_crawl_single_part() {
    let server = MockServer::start().await;

    mount_page(&server, "/", listing("allmakes", &[("Acme", "/acme")])).await;
    mount_page(
        &server,
        "/acme",
        listing("allcategories", &[("Brakes", "/acme/brakes")]),
    )
    .await;
    mount_page(
        &server,
        "/acme/brakes",
        listing("allmodels", &[("Model X", "/acme/brakes/model-x")]),
    )
    .await;
    mount_page(&server, "/acme/brakes/model-x", parts_page(&["100 - Pad"])).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), &db_path(&dir));
    let mut coordinator = Coordinator::new(config, "test-hash").unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(coordinator.state(), CrawlerState::Closed);
    assert_eq!(summary.reason, CLOSE_FINISHED);
    assert_eq!(summary.items_scraped, 1);
    assert_eq!(summary.items_written, 1);
    assert_eq!(summary.requests_sent, 4);
    assert_eq!(summary.requests_failed, 0);

    let products = all_products(&db_path(&dir));
    assert_eq!(products.len(), 1);
    let product = &products[0];
    assert_eq!(product.make, "Acme");
    assert_eq!(product.category, "brakes");
    assert_eq!(product.model, "Model X");
    assert_eq!(product.part_type, None);
    assert_eq!(product.part_number, "100");

    let storage = SqliteStorage::new(&db_path(&dir)).unwrap();
    let run = storage.get_run(coordinator.run_id()).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.close_reason.as_deref(), Some("finished"));
    assert_eq!(run.items_scraped, 1);
    assert_eq!(run.config_hash, "test-hash");
}

#[tokio::test]
async fn test_failed_branch_does_not_stop_siblings() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        listing("allmakes", &[("Acme", "/acme"), ("Bolt", "/bolt")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/bolt",
        listing("allcategories", &[("Engine", "/bolt/engine")]),
    )
    .await;
    mount_page(
        &server,
        "/bolt/engine",
        listing("allmodels", &[("B1", "/bolt/engine/b1")]),
    )
    .await;
    mount_page(&server, "/bolt/engine/b1", parts_page(&["700 - Filter"])).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), &db_path(&dir));
    let mut coordinator = Coordinator::new(config, "hash").unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.reason, CLOSE_FINISHED);
    assert_eq!(summary.requests_failed, 1);
    assert_eq!(summary.items_scraped, 1);

    let products = all_products(&db_path(&dir));
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].make, "Bolt");
    assert_eq!(products[0].category, "engine");
    assert_eq!(products[0].part_number, "700");
}

#[tokio::test]
async fn test_every_part_on_a_page_is_stored() {
    let server = MockServer::start().await;

    mount_page(&server, "/", listing("allmakes", &[("Acme", "/acme")])).await;
    mount_page(
        &server,
        "/acme",
        listing("allcategories", &[("Brakes", "/acme/brakes")]),
    )
    .await;
    mount_page(
        &server,
        "/acme/brakes",
        listing("allmodels", &[("Model X", "/acme/brakes/x")]),
    )
    .await;
    mount_page(
        &server,
        "/acme/brakes/x",
        parts_page(&[
            "100 - Pad",
            "AB-99<span> OEM </span>",
            "XYZ999",
            " - Unnumbered gasket",
        ]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), &db_path(&dir));
    let mut coordinator = Coordinator::new(config, "hash").unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.items_scraped, 3);
    assert_eq!(summary.items_dropped, 1);

    let products = all_products(&db_path(&dir));
    let parts: Vec<(&str, Option<&str>)> = products
        .iter()
        .map(|p| (p.part_number.as_str(), p.part_type.as_deref()))
        .collect();
    assert_eq!(
        parts,
        vec![("100", None), ("AB", Some("oem")), ("XYZ999", None)]
    );
}

#[tokio::test]
async fn test_sibling_branches_keep_their_own_context() {
    let server = MockServer::start().await;

    mount_page(&server, "/", listing("allmakes", &[("Acme", "/acme")])).await;
    mount_page(
        &server,
        "/acme",
        listing(
            "allcategories",
            &[("Brakes", "/acme/brakes"), ("ENGINE ", "/acme/engine")],
        ),
    )
    .await;
    mount_page(
        &server,
        "/acme/brakes",
        listing("allmodels", &[("Model X", "/acme/brakes/x")]),
    )
    .await;
    mount_page(
        &server,
        "/acme/engine",
        listing("allmodels", &[("Model Y", "/acme/engine/y")]),
    )
    .await;
    mount_page(&server, "/acme/brakes/x", parts_page(&["100 - Pad"])).await;
    mount_page(&server, "/acme/engine/y", parts_page(&["200 - Piston"])).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), &db_path(&dir));
    let mut coordinator = Coordinator::new(config, "hash").unwrap();

    coordinator.run().await.unwrap();

    let storage = SqliteStorage::new(&db_path(&dir)).unwrap();
    let engine = storage
        .query_products(
            &ProductFilter {
                category: Some("engine".to_string()),
                ..ProductFilter::default()
            },
            &Pagination::default(),
        )
        .unwrap();

    assert_eq!(storage.count_products().unwrap(), 2);
    assert_eq!(engine.total, 1);
    assert_eq!(engine.items[0].model, "Model Y");
    assert_eq!(engine.items[0].part_number, "200");
}

#[tokio::test]
async fn test_entries_without_links_and_empty_listings() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><body><div class="allmakes"><ul>
            <li><a>Orphan</a></li>
            <li><a href="/acme">Acme</a></li>
            <li><a href="/bolt"> </a></li>
        </ul></div></body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/acme",
        "<html><body><p>No categories yet</p></body></html>".to_string(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), &db_path(&dir));
    let mut coordinator = Coordinator::new(config, "hash").unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.reason, CLOSE_FINISHED);
    assert_eq!(summary.requests_sent, 2);
    assert_eq!(summary.entries_skipped, 2);
    assert_eq!(summary.empty_listings, 1);
    assert_eq!(summary.items_scraped, 0);
}

#[tokio::test]
async fn test_offsite_links_are_filtered() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        listing(
            "allmakes",
            &[
                ("Elsewhere", "http://parts.elsewhere.test/acme"),
                ("Acme", "/acme"),
            ],
        ),
    )
    .await;
    mount_page(
        &server,
        "/acme",
        "<html><body></body></html>".to_string(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), &db_path(&dir));
    config.catalog.allowed_domains = vec!["127.0.0.1".to_string()];
    let mut coordinator = Coordinator::new(config, "hash").unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.offsite_filtered, 1);
    assert_eq!(summary.requests_sent, 2);
    assert_eq!(summary.requests_failed, 0);
}

#[tokio::test]
async fn test_crawl_from_config_file() {
    let server = MockServer::start().await;

    mount_page(&server, "/", listing("brand-list", &[("Acme", "/acme")])).await;
    mount_page(
        &server,
        "/acme",
        listing("allcategories", &[("Brakes", "/acme/brakes")]),
    )
    .await;
    mount_page(
        &server,
        "/acme/brakes",
        listing("allmodels", &[("Model X", "/acme/brakes/x")]),
    )
    .await;
    mount_page(&server, "/acme/brakes/x", parts_page(&["100 - Pad"])).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    write!(
        file,
        r#"
[crawler]
concurrent-requests = 2
request-timeout = 5000
start-delay-min = 0
start-delay-max = 0

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[catalog]
start-urls = ["{}/"]

[selectors]
makes = "div.brand-list li"

[output]
database-path = "{}"
summary-path = "{}"
"#,
        server.uri(),
        db_path(&dir).display(),
        dir.path().join("summary.md").display()
    )
    .unwrap();
    drop(file);

    let (config, hash) = load_config_with_hash(&config_path).unwrap();
    let summary = crawl(config, &hash).await.unwrap();

    assert_eq!(summary.items_scraped, 1);
    let storage = SqliteStorage::new(&db_path(&dir)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.config_hash, hash);
    assert_eq!(run.items_scraped, 1);
}
