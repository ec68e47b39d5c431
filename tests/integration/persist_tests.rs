//! Document and page persistence against a mock server

use crate::support::test_config;
use doc_harvest::crawler::{build_http_client, FetchError, Fetcher, HarvestContext, HttpFetcher};
use doc_harvest::persist::{persist_document, persist_page, PersistError, PersistOutcome};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn context(dir: &TempDir) -> HarvestContext {
    HarvestContext::from_config(&test_config(dir.path())).unwrap()
}

/// A context spacing same-domain requests by 200-250 ms
fn paced_context(dir: &TempDir) -> HarvestContext {
    let mut config = test_config(dir.path());
    config.crawler.rate_limit_min_ms = 200;
    config.crawler.rate_limit_max_ms = 250;
    HarvestContext::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_download_then_skip_existing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/budget.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 budget".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let dest = dir.path().join("out/Acton");
    let url = format!("{}/files/budget.pdf?download=1", mock_server.uri());

    let first = persist_document(&mut ctx, &url, &dest).await.unwrap();
    assert!(first.was_written());
    assert_eq!(first.path(), dest.join("budget.pdf"));
    assert_eq!(fs::read(dest.join("budget.pdf")).unwrap(), b"%PDF-1.4 budget");
    assert!(!dest.join("budget.pdf.part").exists());

    let second = persist_document(&mut ctx, &url, &dest).await.unwrap();
    assert_eq!(second, PersistOutcome::Skipped(dest.join("budget.pdf")));
}

#[tokio::test]
async fn test_download_retries_once_then_succeeds() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/minutes.pdf"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/minutes.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let dest = dir.path().join("out/Bedford");

    let outcome = persist_document(
        &mut ctx,
        &format!("{}/files/minutes.pdf", mock_server.uri()),
        &dest,
    )
    .await
    .unwrap();

    assert!(outcome.was_written());
    assert_eq!(fs::read(dest.join("minutes.pdf")).unwrap(), b"%PDF");
}

#[tokio::test]
async fn test_download_gives_up_after_attempts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/missing.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let dest = dir.path().join("out/Carlisle");

    let result = persist_document(
        &mut ctx,
        &format!("{}/files/missing.pdf", mock_server.uri()),
        &dest,
    )
    .await;

    assert!(matches!(result, Err(PersistError::Status { status: 500, .. })));
    assert!(!dest.join("missing.pdf").exists());
    assert!(!dest.join("missing.pdf.part").exists());
}

#[tokio::test]
async fn test_document_center_link_gets_pdf_extension() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/DocumentCenter/View/42/Annual-Report"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let dest = dir.path().join("out/Dover");

    let outcome = persist_document(
        &mut ctx,
        &format!("{}/DocumentCenter/View/42/Annual-Report", mock_server.uri()),
        &dest,
    )
    .await
    .unwrap();

    assert_eq!(outcome.path(), dest.join("Annual-Report.pdf"));
}

#[tokio::test]
async fn test_page_saved_as_markdown() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clerk/minutes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Minutes</title></head><body>
                <nav>Site navigation</nav>
                <main><h1>Select Board Minutes</h1><p>Meeting called to order.</p></main>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let dest = dir.path().join("out/Essex");
    let url = format!("{}/clerk/minutes", mock_server.uri());

    let outcome = persist_page(&mut ctx, &url, &dest).await.unwrap();
    assert_eq!(outcome, PersistOutcome::Written(dest.join("minutes.md")));

    let markdown = fs::read_to_string(dest.join("minutes.md")).unwrap();
    assert!(markdown.contains("Select Board Minutes"));
    assert!(markdown.contains("Meeting called to order."));
    assert!(!markdown.contains("Site navigation"));

    // Existing file short-circuits before any request
    let again = persist_page(&mut ctx, &url, &dest).await.unwrap();
    assert!(!again.was_written());
}

#[tokio::test]
async fn test_document_domain_page_goes_under_title_folder() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/print/AB12"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Town of Acton, MA Town of Acton, MA</title></head>
            <body><div class="content"><h2>Chapter 1</h2><p>General provisions.</p></div></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    ctx.rules.document_domain = Some("127.0.0.1".to_string());
    let dest = dir.path().join("out/Acton");

    let outcome = persist_page(
        &mut ctx,
        &format!("{}/print/AB12?guid=AB12", mock_server.uri()),
        &dest,
    )
    .await
    .unwrap();

    let expected = dest.join("Town of Acton, MA").join("AB12.md");
    assert_eq!(outcome, PersistOutcome::Written(expected.clone()));
    assert!(fs::read_to_string(expected)
        .unwrap()
        .contains("General provisions."));
}

#[tokio::test]
async fn test_page_http_error_is_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);

    let result = persist_page(
        &mut ctx,
        &format!("{}/gone", mock_server.uri()),
        &dir.path().join("out/Foxborough"),
    )
    .await;
    assert!(matches!(result, Err(PersistError::Status { status: 404, .. })));
}

#[tokio::test]
async fn test_http_fetcher_loads_and_rereads() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>ok</body></html>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html><body>bad gateway</body></html>"))
        .mount(&mock_server)
        .await;

    let config = doc_harvest::config::UserAgentConfig::default();
    let client = build_http_client(&config, Duration::from_secs(5)).unwrap();
    let mut fetcher = HttpFetcher::new(client);

    let page = fetcher
        .fetch(&format!("{}/listing", mock_server.uri()))
        .await
        .unwrap();
    assert!(page.body.contains("ok"));
    assert_eq!(fetcher.current_body().await.unwrap(), page.body);

    // Error statuses still hand back the body
    let broken = fetcher
        .fetch(&format!("{}/broken", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(broken.status, 502);
    assert!(matches!(
        broken.status_error(),
        Some(FetchError::Status { status: 502, .. })
    ));
}

#[tokio::test]
async fn test_every_request_waits_for_rate_limit() {
    let mock_server = MockServer::start().await;
    for file in ["agenda.pdf", "warrant.pdf"] {
        Mock::given(method("GET"))
            .and(path(format!("/files/{}", file)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/clerk/hours"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><main>Open 9-5</main></body></html>"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut ctx = paced_context(&dir);
    let dest = dir.path().join("out/Lincoln");
    let uri = mock_server.uri();

    let started = std::time::Instant::now();
    persist_document(&mut ctx, &format!("{}/files/agenda.pdf", uri), &dest)
        .await
        .unwrap();
    assert!(ctx.rate_limiter.last_request("127.0.0.1").is_some());

    persist_document(&mut ctx, &format!("{}/files/warrant.pdf", uri), &dest)
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));

    persist_page(&mut ctx, &format!("{}/clerk/hours", uri), &dest)
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_download_retry_waits_for_rate_limit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/budget.pdf"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/budget.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut ctx = paced_context(&dir);
    let dest = dir.path().join("out/Maynard");

    let started = std::time::Instant::now();
    let outcome = persist_document(
        &mut ctx,
        &format!("{}/files/budget.pdf", mock_server.uri()),
        &dest,
    )
    .await
    .unwrap();

    assert!(outcome.was_written());
    assert!(started.elapsed() >= Duration::from_millis(200));
}
