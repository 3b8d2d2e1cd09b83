use crate::record::PageRecord;
use crate::registry::LinkRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Everything a finished crawl produced.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub session_id: Uuid,
    pub base_url: String,
    pub root_key: String,
    pub max_depth: usize,
    pub max_pages: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub visited_count: usize,
    /// The crawl stopped because the page budget ran out, not because the
    /// frontier was drained.
    pub budget_exhausted: bool,
    /// Set when the root page itself could not be fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
    pub registry: LinkRegistry,
}

impl CrawlOutcome {
    pub fn record(&self, key: &str) -> Option<&PageRecord> {
        self.registry.get(key)
    }

    /// Records in discovery order. Links marked as not to be visited are
    /// left out unless `include_skipped` is set.
    pub fn links(&self, include_skipped: bool) -> Vec<&PageRecord> {
        self.registry
            .iter()
            .filter(|record| include_skipped || !record.dont_visit)
            .collect()
    }

    pub fn broken_links(&self) -> Vec<&PageRecord> {
        self.registry.iter().filter(|r| r.is_broken()).collect()
    }

    pub fn duration_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
