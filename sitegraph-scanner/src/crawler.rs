use crate::document::PageDocument;
use crate::error::{Result, ScanError};
use crate::extract::{LinkExtractor, LinkFilter};
use crate::fetch::{FetchResponse, Fetcher, FileFetcher, HttpFetcher};
use crate::frontier::Frontier;
use crate::record::PageRecord;
use crate::registry::LinkRegistry;
use crate::resolve::UrlResolver;
use crate::result::CrawlOutcome;
use chrono::Utc;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Called with `(depth, url)` right before a page is fetched.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Status recorded when no response was received at all.
pub const TRANSPORT_FAILURE_STATUS: u16 = 404;

const RETRY_BACKOFF_MS: u64 = 250;

/// Mutable state of one crawl. Owned by the coordinating task; fetches never
/// touch it directly.
pub(crate) struct CrawlSession {
    resolver: UrlResolver,
    max_depth: usize,
    max_pages: usize,
    visited_count: usize,
    registry: LinkRegistry,
    frontier: Frontier,
    claimed: HashSet<String>,
}

impl CrawlSession {
    fn new(resolver: UrlResolver, max_depth: usize, max_pages: usize) -> Self {
        Self {
            resolver,
            max_depth,
            max_pages,
            visited_count: 0,
            registry: LinkRegistry::new(),
            frontier: Frontier::new(),
            claimed: HashSet::new(),
        }
    }

    fn budget_reached(&self) -> bool {
        self.visited_count >= self.max_pages
    }

    /// Register the synthetic root record and return its key.
    fn seed(&mut self) -> String {
        let key = self.resolver.root_key();
        self.registry
            .insert(PageRecord::root(key.clone(), key.clone()));
        key
    }

    /// Reserve `key` for fetching. Returns the URL to fetch, or `None` when
    /// the record must not be fetched or already has been.
    fn claim(&mut self, key: &str) -> Option<String> {
        let record = self.registry.get(key)?;

        if record.dont_visit {
            debug!("Skipping {} (not crawlable)", key);
            return None;
        }
        if record.is_fetched() || !self.claimed.insert(key.to_string()) {
            return None;
        }

        Some(record.absolute_url.clone())
    }

    /// Fold the result of fetching `key` at `depth` into the registry and
    /// schedule its children.
    fn apply(
        &mut self,
        key: &str,
        depth: usize,
        fetched: Result<FetchResponse>,
        filter: Option<&LinkFilter>,
    ) {
        let Some(record) = self.registry.get_mut(key) else {
            return;
        };

        if record.depth.is_none() {
            record.depth = Some(depth);
        }

        let response = match fetched {
            Ok(response) => response,
            Err(e) => {
                warn!("Fetch failed for {}: {}", record.absolute_url, e);
                record.status_code = Some(TRANSPORT_FAILURE_STATUS);
                record.error_code = Some(e.error_code().to_string());
                record.error_message = Some(e.to_string());
                return;
            }
        };

        record.status_code = Some(response.status);
        record.content_type = response.content_type.clone();

        if response.status != 200 {
            let e = ScanError::Http {
                url: response.url.clone(),
                status: response.status,
            };
            debug!("{}", e);
            record.error_code = Some(e.error_code().to_string());
            record.error_message = Some(e.to_string());
            return;
        }

        if !response.is_html() {
            debug!(
                "Not parsing {} ({})",
                response.url,
                response.content_type.as_deref().unwrap_or("no content type")
            );
            return;
        }

        let source_url = record.absolute_url.clone();
        let document = PageDocument::parse(&response.body);
        record.image_count = Some(document.image_count);
        record.visited = true;
        self.visited_count += 1;

        // External pages are checked, never followed.
        if record.external_link {
            info!(
                "Visited external page {} [depth {}] ({} images)",
                source_url, depth, document.image_count
            );
            return;
        }

        let extraction = LinkExtractor::new(&self.resolver)
            .with_filter(filter)
            .extract(&document, key, &source_url);

        info!(
            "Visited {} [depth {}] ({} links, {} images)",
            source_url,
            depth,
            extraction.children.len(),
            extraction.image_count
        );

        let child_depth = depth + 1;
        if child_depth >= self.max_depth {
            return;
        }

        let children = self
            .registry
            .merge_children(&source_url, extraction.children, child_depth);
        self.frontier.schedule(child_depth, key, children);
    }
}

/// Breadth-first crawler over one site.
///
/// Depth 0 is the base URL; depths `1..max_depth` are drained from the
/// frontier in order. Within a depth up to `workers` fetches are in flight at
/// once, and every registry update happens on the task driving the crawl.
pub struct Crawler<F = HttpFetcher> {
    fetcher: F,
    max_depth: usize,
    max_pages: usize,
    workers: usize,
    retries: u32,
    link_filter: Option<LinkFilter>,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler<HttpFetcher> {
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::with_timeout(timeout_secs)?))
    }
}

impl Crawler<FileFetcher> {
    /// Crawler over HTML files on disk.
    pub fn local() -> Self {
        Self::with_fetcher(FileFetcher::new())
    }
}

impl<F: Fetcher> Crawler<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            max_depth: 3,
            max_pages: 50,
            workers: 1,
            retries: 0,
            link_filter: None,
            progress_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_link_filter(mut self, filter: LinkFilter) -> Self {
        self.link_filter = Some(filter);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Crawl the site rooted at `base_url`.
    ///
    /// An invalid base URL is the only error; per-page failures end up on the
    /// page records, and a root that cannot be fetched is reported through
    /// [`CrawlOutcome::fatal_error`].
    pub async fn crawl(&self, base_url: &str) -> Result<CrawlOutcome> {
        let resolver = if self.fetcher.is_local() {
            UrlResolver::local(base_url)?
        } else {
            UrlResolver::new(base_url)?
        };

        info!(
            "Starting crawl of {} (max depth {}, max pages {}, {} workers)",
            resolver.base_url(),
            self.max_depth,
            self.max_pages,
            self.workers
        );

        let started_at = Utc::now();
        let base_url = resolver.base_url().to_string();
        let mut session = CrawlSession::new(resolver, self.max_depth, self.max_pages);

        // The root is visited whatever the budget says.
        let root_key = session.seed();
        let fatal_error = match session.claim(&root_key) {
            Some(root_url) => {
                self.report_progress(0, &root_url);
                let fetched = self.fetch_with_retries(&root_url).await;
                let fatal = fetched
                    .as_ref()
                    .err()
                    .map(|e| format!("Failed to fetch {}: {}", root_url, e));
                session.apply(&root_key, 0, fetched, self.link_filter.as_ref());
                fatal
            }
            None => None,
        };

        let budget_exhausted = if fatal_error.is_some() {
            false
        } else {
            self.drain(&mut session).await
        };

        info!(
            "Crawl complete. Visited {} pages, {} links recorded",
            session.visited_count,
            session.registry.len()
        );

        Ok(CrawlOutcome {
            session_id: Uuid::new_v4(),
            base_url,
            root_key,
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            started_at,
            finished_at: Utc::now(),
            visited_count: session.visited_count,
            budget_exhausted,
            fatal_error,
            registry: session.registry,
        })
    }

    /// Visit every scheduled entry, depth by depth. Returns `true` if the
    /// page budget stopped the walk.
    async fn drain(&self, session: &mut CrawlSession) -> bool {
        for depth in 1..self.max_depth {
            if session.budget_reached() {
                let exhausted = !session.frontier.is_empty();
                if exhausted {
                    info!("Page budget of {} reached", session.max_pages);
                }
                return exhausted;
            }

            let mut pending = session.frontier.take_level(depth);
            if pending.is_empty() {
                continue;
            }
            debug!("Draining depth {} ({} entries)", depth, pending.len());

            let mut in_flight = FuturesUnordered::new();

            loop {
                // Only dispatch what the budget can still absorb.
                while in_flight.len() < self.workers
                    && session.visited_count + in_flight.len() < session.max_pages
                {
                    let Some(entry) = pending.pop_front() else {
                        break;
                    };
                    let Some(url) = session.claim(&entry.child) else {
                        continue;
                    };

                    self.report_progress(depth, &url);
                    let key = entry.child;
                    in_flight.push(async move {
                        let fetched = self.fetch_with_retries(&url).await;
                        (key, fetched)
                    });
                }

                let Some((key, fetched)) = in_flight.next().await else {
                    break;
                };

                if session.budget_reached() {
                    debug!("Discarding {} fetched past the page budget", key);
                    continue;
                }

                session.apply(&key, depth, fetched, self.link_filter.as_ref());
            }

            if session.budget_reached() && !pending.is_empty() {
                info!(
                    "Page budget of {} reached with {} entries left at depth {}",
                    session.max_pages,
                    pending.len(),
                    depth
                );
                return true;
            }
        }

        false
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<FetchResponse> {
        let mut attempt: u32 = 0;
        loop {
            match self.fetcher.fetch(url).await {
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    debug!("Retrying {} ({}/{}): {}", url, attempt, self.retries, e);
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64))
                        .await;
                }
                other => return other,
            }
        }
    }

    fn report_progress(&self, depth: usize, url: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(depth, url.to_string());
        }
    }
}
