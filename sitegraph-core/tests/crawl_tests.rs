// Tests for crawl functionality

use sitegraph_core::crawl::{CrawlOptions, execute_crawl, generate_crawl_report};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// HTTP Crawl Tests
// ============================================================================

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

/// Site: / -> /, /about, /missing, /style.css, partner page, mailto
///       /about -> team (relative)
async fn mount_site() -> (MockServer, MockServer) {
    let site = MockServer::start().await;
    let partner = MockServer::start().await;

    let root_body = format!(
        r#"<html><body>
            <a href="/about">About us</a>
            <a href="/missing">Old page</a>
            <a href="/style.css">Styles</a>
            <a href="{}/page">Partner</a>
            <a href="mailto:hello@example.com">Mail</a>
            <img src="/logo.png">
        </body></html>"#,
        partner.uri()
    );

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&root_body))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<a href="team">Team</a><a href="/about#top">Top</a>"#))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/about/team"))
        .respond_with(html("<p>The team</p>"))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("body {}", "text/css"))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html(r#"<a href="/elsewhere">Elsewhere</a>"#))
        .mount(&partner)
        .await;

    (site, partner)
}

fn options_for(url: &str) -> CrawlOptions {
    CrawlOptions {
        url: url.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_crawl_site_records_every_link() {
    let (site, partner) = mount_site().await;

    let outcome = execute_crawl(options_for(&site.uri()), None).await.unwrap();

    assert!(outcome.fatal_error.is_none());
    assert_eq!(outcome.visited_count, 4);
    assert!(!outcome.budget_exhausted);

    let root = outcome.record(&site.uri()).unwrap();
    assert!(root.visited);
    assert_eq!(root.image_count, Some(1));
    assert!(root.original_hrefs.contains("/"));
    assert!(outcome.record("/").is_none());
    let root_requests = site
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/")
        .count();
    assert_eq!(root_requests, 1);

    let about = outcome.record("/about").unwrap();
    assert!(about.visited);
    assert_eq!(about.depth, Some(1));
    assert_eq!(about.status_code, Some(200));
    assert_eq!(about.anchor_texts, vec!["About us".to_string(), "Top".to_string()]);

    let team = outcome.record("/about/team").unwrap();
    assert!(team.visited);
    assert_eq!(team.depth, Some(2));
    assert_eq!(team.absolute_url, format!("{}/about/team", site.uri()));

    let missing = outcome.record("/missing").unwrap();
    assert_eq!(missing.status_code, Some(404));
    assert!(!missing.visited);
    assert_eq!(missing.error_code.as_deref(), Some("http"));

    let css = outcome.record("/style.css").unwrap();
    assert_eq!(css.status_code, Some(200));
    assert!(!css.visited);

    let external_key = format!("{}/page", partner.uri());
    let external = outcome.record(&external_key).unwrap();
    assert!(external.external_link);
    assert_eq!(external.status_code, Some(200));
    assert!(external.visited);
    assert_eq!(external.image_count, Some(0));
    assert!(outcome.record("/elsewhere").is_none());
    assert_eq!(partner.received_requests().await.unwrap().len(), 1);

    let mail = outcome.record("mailto:hello@example.com").unwrap();
    assert!(mail.dont_visit);
    assert!(mail.status_code.is_none());

    assert_eq!(outcome.broken_links().len(), 1);
}

#[tokio::test]
async fn test_crawl_respects_max_depth() {
    let (site, _partner) = mount_site().await;

    let options = CrawlOptions {
        max_depth: 2,
        ..options_for(&site.uri())
    };
    let outcome = execute_crawl(options, None).await.unwrap();

    assert!(outcome.registry.iter().all(|r| r.depth.unwrap_or(0) <= 1));
    assert!(outcome.record("/about/team").is_none());
}

#[tokio::test]
async fn test_crawl_respects_page_budget() {
    let (site, _partner) = mount_site().await;

    let options = CrawlOptions {
        max_pages: 2,
        workers: 3,
        ..options_for(&site.uri())
    };
    let outcome = execute_crawl(options, None).await.unwrap();

    assert_eq!(outcome.visited_count, 2);
    assert_eq!(outcome.registry.visited_count(), 2);
    assert!(outcome.budget_exhausted);
}

#[tokio::test]
async fn test_crawl_invalid_url_is_an_error() {
    let result = execute_crawl(options_for("ftp://example.com"), None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_crawl_unreachable_root_is_fatal() {
    let options = CrawlOptions {
        timeout_secs: 2,
        ..options_for("http://127.0.0.1:9")
    };
    let outcome = execute_crawl(options, None).await.unwrap();

    assert!(outcome.fatal_error.is_some());
    assert_eq!(outcome.visited_count, 0);
    assert_eq!(outcome.registry.len(), 1);
}

#[tokio::test]
async fn test_crawl_report_lists_records() {
    let (site, _partner) = mount_site().await;

    let outcome = execute_crawl(options_for(&site.uri()), None).await.unwrap();

    let report = generate_crawl_report(&outcome, true);
    assert!(report.contains("Pages visited: 4"));
    assert!(report.contains("## Depth 0"));
    assert!(report.contains("/about/team"));
    assert!(report.contains("mailto:hello@example.com"));
    assert!(report.contains("text/css"));

    let hidden = generate_crawl_report(&outcome, false);
    assert!(!hidden.contains("mailto:hello@example.com"));
}

// ============================================================================
// Local Crawl Tests
// ============================================================================

#[tokio::test]
async fn test_local_crawl() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(
        root.join("index.html"),
        r#"<a href="about.html">About</a><a href="sub/page.html">Sub</a><a href="gone.html">Gone</a>"#,
    )
    .unwrap();
    fs::write(root.join("about.html"), "<p>about</p>").unwrap();
    fs::write(
        root.join("sub/page.html"),
        r#"<a href="../about.html">Back to about</a>"#,
    )
    .unwrap();

    let base = root.join("index.html");
    let options = CrawlOptions {
        local: true,
        ..options_for(base.to_str().unwrap())
    };
    let outcome = execute_crawl(options, None).await.unwrap();

    assert!(outcome.fatal_error.is_none());
    assert_eq!(outcome.visited_count, 3);

    let about_key = root.join("about.html").to_string_lossy().into_owned();
    let about = outcome.record(&about_key).unwrap();
    assert!(about.visited);
    assert_eq!(about.anchor_texts.len(), 2);

    let gone_key = root.join("gone.html").to_string_lossy().into_owned();
    let gone = outcome.record(&gone_key).unwrap();
    assert_eq!(gone.status_code, Some(404));
    assert_eq!(gone.error_code.as_deref(), Some("not_found"));
}

#[tokio::test]
async fn test_local_crawl_from_directory() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(
        root.join("index.html"),
        r#"<a href="about.html">About</a><a href="index.html">Home</a>"#,
    )
    .unwrap();
    fs::write(root.join("about.html"), r#"<a href="index.html">Up</a>"#).unwrap();

    let options = CrawlOptions {
        local: true,
        ..options_for(root.to_str().unwrap())
    };
    let outcome = execute_crawl(options, None).await.unwrap();

    assert!(outcome.fatal_error.is_none());
    assert_eq!(outcome.visited_count, 2);

    let about_key = root.join("about.html").to_string_lossy().into_owned();
    let about = outcome.record(&about_key).unwrap();
    assert_eq!(about.absolute_url, about_key);
    assert_eq!(about.status_code, Some(200));
    assert!(about.visited);
    assert!(about.error_code.is_none());

    let index_key = root.join("index.html").to_string_lossy().into_owned();
    assert!(outcome.record(&index_key).is_none());
    assert!(outcome.broken_links().is_empty());
}
