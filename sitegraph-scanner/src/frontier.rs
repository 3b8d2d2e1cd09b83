use std::collections::{BTreeMap, VecDeque};

/// One pending visit: `child` was discovered on `parent` and is due at `depth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub depth: usize,
    pub parent: String,
    pub child: String,
}

/// Pending visits grouped by depth. Within a depth, entries keep the order
/// parents were scheduled in and, per parent, the order children were found.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    levels: BTreeMap<usize, VecDeque<FrontierEntry>>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<I>(&mut self, depth: usize, parent: &str, children: I)
    where
        I: IntoIterator<Item = String>,
    {
        let level = self.levels.entry(depth).or_default();
        level.extend(children.into_iter().map(|child| FrontierEntry {
            depth,
            parent: parent.to_string(),
            child,
        }));
    }

    /// Remove and return every entry scheduled at `depth`.
    pub fn take_level(&mut self, depth: usize) -> VecDeque<FrontierEntry> {
        self.levels.remove(&depth).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.levels.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
