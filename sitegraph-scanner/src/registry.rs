use crate::record::PageRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Canonical key -> page record, in the order keys were first discovered.
/// Records are only ever added or updated in place.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct LinkRegistry {
    records: Vec<PageRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&PageRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PageRecord> {
        self.index.get(key).map(|&i| &mut self.records[i])
    }

    /// Add a record under its canonical key. Returns `false` and leaves the
    /// registry untouched if the key is already present.
    pub fn insert(&mut self, record: PageRecord) -> bool {
        if self.index.contains_key(&record.canonical_key) {
            return false;
        }
        self.index
            .insert(record.canonical_key.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter()
    }

    pub fn visited_count(&self) -> usize {
        self.records.iter().filter(|r| r.visited).count()
    }

    /// Merge the children extracted from the page at `source_url` into the
    /// registry at `depth`, returning their keys in discovery order.
    ///
    /// New keys are inserted with `source_link` and `depth` set. Known keys
    /// keep their source and depth (the first discovery wins) and accumulate
    /// the new raw hrefs and anchor texts.
    pub fn merge_children(
        &mut self,
        source_url: &str,
        children: Vec<PageRecord>,
        depth: usize,
    ) -> Vec<String> {
        let mut keys = Vec::with_capacity(children.len());

        for mut child in children {
            let key = child.canonical_key.clone();

            match self.get_mut(&key) {
                Some(existing) => {
                    existing.original_hrefs.append(&mut child.original_hrefs);
                    existing.anchor_texts.append(&mut child.anchor_texts);
                    if existing.depth.is_none() {
                        existing.depth = Some(depth);
                    }
                }
                None => {
                    child.source_link = Some(source_url.to_string());
                    child.depth = Some(depth);
                    self.insert(child);
                }
            }

            keys.push(key);
        }

        keys
    }
}
