use crate::error::{Result, ScanError};
use reqwest::Client;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "Sitegraph/0.1 (https://github.com/trapdoorsec/sitegraph)";

/// What came back for one URL.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Only populated for HTML responses.
    pub body: String,
}

impl FetchResponse {
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
    }
}

/// Retrieves pages for the scheduler.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse>> + Send;

    /// Whether URLs handed to this fetcher are filesystem paths.
    fn is_local(&self) -> bool {
        false
    }
}

/// Network fetcher. Redirects are followed and cookies persist across
/// requests made through the same instance.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Self::with_options(timeout_secs, DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ScanError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut fetched = FetchResponse {
            url: url.to_string(),
            status,
            content_type,
            body: String::new(),
        };

        if fetched.is_html() {
            fetched.body = response.text().await?;
        }

        Ok(fetched)
    }
}

/// Reads pages from disk. A directory is served through its `index.html`.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher;

impl FileFetcher {
    pub fn new() -> Self {
        Self
    }

    fn content_type_for(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("html" | "htm" | "xhtml") => "text/html; charset=utf-8",
            Some("txt") => "text/plain",
            Some("css") => "text/css",
            Some("js") => "application/javascript",
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("pdf") => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        debug!("Reading {}", url);

        let mut path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        if tokio::fs::metadata(&path).await?.is_dir() {
            path.push("index.html");
        }

        let bytes = tokio::fs::read(&path).await?;
        let content_type = Self::content_type_for(&path);
        let body = if content_type.starts_with("text/html") {
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            String::new()
        };

        Ok(FetchResponse {
            url: url.to_string(),
            status: 200,
            content_type: Some(content_type.to_string()),
            body,
        })
    }

    fn is_local(&self) -> bool {
        true
    }
}
