use crate::document::PageDocument;
use crate::record::PageRecord;
use crate::resolve::{UrlResolver, is_crawlable, normalize_link};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Accept/reject decision for a crawlable link's absolute URL. Rejected links
/// are still recorded, but marked as not to be visited.
pub type LinkFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// What one page contributed.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub image_count: usize,
    /// One candidate per distinct canonical key, in discovery order.
    pub children: Vec<PageRecord>,
}

pub struct LinkExtractor<'a> {
    resolver: &'a UrlResolver,
    filter: Option<&'a LinkFilter>,
}

impl<'a> LinkExtractor<'a> {
    pub fn new(resolver: &'a UrlResolver) -> Self {
        Self {
            resolver,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<&'a LinkFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Build candidate child records for every anchor on the page identified
    /// by `source_key` and fetched from `source_url`.
    ///
    /// Within one pass the first anchor for a key wins; later anchors that
    /// resolve to the same key are ignored. Merging with records already in
    /// the registry is left to [`crate::registry::LinkRegistry::merge_children`].
    pub fn extract(&self, document: &PageDocument, source_key: &str, source_url: &str) -> Extraction {
        let mut seen = HashSet::new();
        let mut children = Vec::new();

        for anchor in &document.anchors {
            let normalized = normalize_link(&anchor.href);
            let crawlable = is_crawlable(&normalized);
            let key = self.resolver.canonical_key(&normalized, source_key);

            if !seen.insert(key.clone()) {
                continue;
            }

            let mut child = PageRecord::new(key);
            child.original_hrefs.insert(anchor.href.clone());
            child.anchor_texts.push(anchor.text.clone());

            if crawlable {
                child.absolute_url = self.resolver.resolve_absolute(&normalized, source_url);
                child.external_link = self.resolver.is_external(&child.absolute_url);
                child.frequency += 1;

                if let Some(filter) = self.filter
                    && !filter(&child.absolute_url)
                {
                    debug!("Skipping {} (rejected by link filter)", child.absolute_url);
                    child.dont_visit = true;
                }
            } else {
                child.absolute_url = anchor.href.trim().to_string();
                child.dont_visit = true;
                child.external_link = false;
            }

            children.push(child);
        }

        Extraction {
            image_count: document.image_count,
            children,
        }
    }
}
