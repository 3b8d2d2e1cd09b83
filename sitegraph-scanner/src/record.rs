use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Text recorded for the synthetic root record.
pub const BASE_URL_TEXT: &str = "BASE_URL";

/// Everything known about one canonical key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub canonical_key: String,
    pub absolute_url: String,
    pub anchor_texts: Vec<String>,
    pub original_hrefs: BTreeSet<String>,
    pub frequency: u32,
    pub visited: bool,
    pub external_link: bool,
    pub dont_visit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count: Option<usize>,
}

impl PageRecord {
    pub fn new(canonical_key: String) -> Self {
        Self {
            canonical_key,
            ..Default::default()
        }
    }

    /// The synthetic record the crawl starts from.
    pub fn root(key: String, absolute_url: String) -> Self {
        let mut original_hrefs = BTreeSet::new();
        original_hrefs.insert(absolute_url.clone());

        Self {
            canonical_key: key,
            absolute_url,
            anchor_texts: vec![BASE_URL_TEXT.to_string()],
            original_hrefs,
            frequency: 1,
            depth: Some(0),
            ..Default::default()
        }
    }

    /// Whether a fetch was already attempted for this record.
    pub fn is_fetched(&self) -> bool {
        self.status_code.is_some()
    }

    pub fn is_broken(&self) -> bool {
        self.status_code.is_some_and(|status| status >= 400)
    }
}
