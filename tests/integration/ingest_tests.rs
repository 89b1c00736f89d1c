//! Integration tests for the ingestion pipeline
//!
//! These tests use wiremock to serve a small catalog and run the full
//! crawl, enrich and persist cycle end-to-end against a temporary database.

use book_ingest::config::{parse_config, Config};
use book_ingest::crawler::run_ingestion;
use book_ingest::state::CrawlState;
use book_ingest::storage::{BookStore, RunStatus, SqliteStorage};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a configuration pointing at the mock server
fn test_config(base_url: &str, db_path: &Path) -> Config {
    let content = format!(
        r#"
[source]
base-url = "{base_url}/"
page-url-pattern = "catalogue/page-{{n}}.html"
readiness-selector = "article.product_pod"

[crawler]
max-pages = 3
max-records = 50
max-attempts = 2
retry-delay-ms = 10
navigation-timeout-ms = 2000

[enrichment]
batch-size = 2
batch-delay-ms = 1

[user-agent]
crawler-name = "TestIngest"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "test@example.com"

[output]
database-path = "{db}"
"#,
        db = db_path.display()
    );

    parse_config(&content).expect("test config should be valid")
}

fn listing_page(page: u32, count: usize, next: bool) -> String {
    let entries: String = (1..=count)
        .map(|i| {
            format!(
                r#"<li><article class="product_pod">
                    <div class="image_container"><img src="/media/{page}-{i}.jpg"></div>
                    <p class="star-rating Two"></p>
                    <h3><a href="/catalogue/title-{page}-{i}_{page}{i}/index.html" title="Title {page}-{i}">Title {page}-{i}</a></h3>
                    <p class="instock availability">In stock</p>
                </article></li>"#
            )
        })
        .collect();
    let pager = if next {
        r#"<ul class="pager"><li class="next"><a href="page-2.html">next</a></li></ul>"#
    } else {
        ""
    };
    format!("<html><body><ol>{}</ol>{}</body></html>", entries, pager)
}

fn detail_page(author: &str, year: i32) -> String {
    format!(
        r#"<html><body><div class="product_main">
            <h1>Book</h1>
            <p class="author"><a>{author}</a></p>
            <p class="publish-year">{year}</p>
        </div></body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Two listing pages of three books each, every detail page available
async fn mount_catalog(server: &MockServer) {
    mount_html(server, "/", listing_page(1, 3, true)).await;
    mount_html(server, "/catalogue/page-2.html", listing_page(2, 3, false)).await;

    for page in 1..=2 {
        for i in 1..=3 {
            mount_html(
                server,
                &format!("/catalogue/title-{page}-{i}_{page}{i}/index.html"),
                detail_page(&format!("Author {page}-{i}"), 1980 + i as i32),
            )
            .await;
        }
    }
}

#[tokio::test]
async fn test_full_ingestion() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("books.db");
    let config = test_config(&server.uri(), &db_path);

    let report = run_ingestion(&config).await.expect("ingestion should succeed");

    assert_eq!(report.final_state, CrawlState::Success);
    assert_eq!(report.records_found, 6);
    assert_eq!(report.records_ingested, 6);
    assert_eq!(report.records_failed, 0);
    assert_eq!(report.attempts, 1);
    assert_eq!(report.pages_fetched, 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["recordsIngested"], 6);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_books().unwrap(), 6);

    let book = storage.get_book("title-2-3_23").unwrap().expect("book stored");
    assert_eq!(book.title, "Title 2-3");
    assert_eq!(book.authors, vec!["Author 2-3".to_string()]);
    assert_eq!(book.year_published, Some(1983));
    assert_eq!(
        book.cover_url,
        Some(format!("{}/media/2-3.jpg", server.uri()))
    );
    assert_eq!(
        book.subjects,
        vec!["Rating: Two".to_string(), "In stock".to_string()]
    );

    let runs = storage.recent_runs(10).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Completed);
    assert_eq!(runs[0].records_ingested, 6);
    assert_eq!(runs[0].config_hash.len(), 64);
}

#[tokio::test]
async fn test_repeated_ingestion_is_idempotent() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("books.db");
    let config = test_config(&server.uri(), &db_path);

    run_ingestion(&config).await.unwrap();
    let first_seen = SqliteStorage::new(&db_path)
        .unwrap()
        .latest_ingest()
        .unwrap()
        .unwrap();

    let second = run_ingestion(&config).await.unwrap();
    assert_eq!(second.records_ingested, 6);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_books().unwrap(), 6);
    assert!(storage.latest_ingest().unwrap().unwrap() >= first_seen);
    assert_eq!(storage.recent_runs(10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_unavailable_source_exhausts_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("books.db");
    let config = test_config(&server.uri(), &db_path);

    let report = run_ingestion(&config).await.expect("exhaustion is not an error");

    assert_eq!(report.final_state, CrawlState::Exhausted);
    assert_eq!(report.records_ingested, 0);
    assert_eq!(report.attempts, 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_books().unwrap(), 0);
    let run = &storage.recent_runs(1).unwrap()[0];
    assert_eq!(run.final_state, Some(CrawlState::Exhausted));
}

#[tokio::test]
async fn test_missing_detail_page_keeps_listing_record() {
    let server = MockServer::start().await;
    mount_html(&server, "/", listing_page(1, 2, false)).await;
    mount_html(
        &server,
        "/catalogue/title-1-1_11/index.html",
        detail_page("Found Author", 2004),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("books.db");
    let config = test_config(&server.uri(), &db_path);

    let report = run_ingestion(&config).await.unwrap();
    assert_eq!(report.records_ingested, 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let enriched = storage.get_book("title-1-1_11").unwrap().unwrap();
    assert_eq!(enriched.authors, vec!["Found Author".to_string()]);

    let plain = storage.get_book("title-1-2_12").unwrap().unwrap();
    assert_eq!(plain.authors, vec!["Unknown".to_string()]);
    assert_eq!(plain.year_published, None);
}

#[tokio::test]
async fn test_enrichment_disabled_skips_detail_pages() {
    let server = MockServer::start().await;
    mount_html(&server, "/", listing_page(1, 3, false)).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("books.db");
    let config = test_config(&server.uri(), &db_path);
    let config = Config {
        enrichment: book_ingest::config::EnrichmentConfig {
            enabled: false,
            ..config.enrichment.clone()
        },
        ..config
    };

    let report = run_ingestion(&config).await.unwrap();
    assert_eq!(report.records_ingested, 3);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let hits = storage.search_books("title 1-2", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "title-1-2_12");
}
