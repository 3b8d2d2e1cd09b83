// Link map: the discovery graph of a finished crawl

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use sitegraph_scanner::{CrawlOutcome, PageRecord};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Serialize)]
pub struct MapNode {
    pub key: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub visited: bool,
    pub external: bool,
}

impl From<&PageRecord> for MapNode {
    fn from(record: &PageRecord) -> Self {
        Self {
            key: record.canonical_key.clone(),
            url: record.absolute_url.clone(),
            status_code: record.status_code,
            visited: record.visited,
            external: record.external_link,
        }
    }
}

/// Nested view of the map rooted at the crawl root.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapNode {
    #[serde(flatten)]
    pub node: MapNode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SitemapNode>,
}

/// Directed `source -> child` graph. Each record has at most one incoming
/// edge: the page it was first discovered on.
#[derive(Debug, Default)]
pub struct LinkMap {
    graph: DiGraph<MapNode, ()>,
    nodes: HashMap<String, NodeIndex>,
    root: Option<NodeIndex>,
}

impl LinkMap {
    pub fn build(outcome: &CrawlOutcome) -> Self {
        let mut map = LinkMap::default();
        let mut by_url: HashMap<&str, NodeIndex> = HashMap::new();

        for record in outcome.registry.iter() {
            let idx = map.graph.add_node(MapNode::from(record));
            map.nodes.insert(record.canonical_key.clone(), idx);
            by_url.entry(record.absolute_url.as_str()).or_insert(idx);
        }

        map.root = map.nodes.get(&outcome.root_key).copied();

        for record in outcome.registry.iter() {
            let Some(ref source) = record.source_link else {
                continue;
            };
            if let (Some(&from), Some(&to)) =
                (by_url.get(source.as_str()), map.nodes.get(&record.canonical_key))
                && from != to
            {
                map.graph.add_edge(from, to, ());
            }
        }

        map
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, key: &str) -> Option<&MapNode> {
        self.nodes.get(key).map(|&idx| &self.graph[idx])
    }

    /// Keys first discovered on the page `key`, in discovery order.
    pub fn children(&self, key: &str) -> Vec<&str> {
        self.nodes
            .get(key)
            .map(|&idx| {
                self.ordered_children(idx)
                    .into_iter()
                    .map(|child| self.graph[child].key.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Visited pages that contributed no new record to the crawl.
    pub fn dead_ends(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].visited)
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].key.as_str())
            .collect()
    }

    pub fn sitemap(&self) -> Option<SitemapNode> {
        let root = self.root?;
        let mut seen = HashSet::new();
        Some(self.subtree(root, &mut seen))
    }

    fn subtree(&self, idx: NodeIndex, seen: &mut HashSet<NodeIndex>) -> SitemapNode {
        seen.insert(idx);
        let children = self
            .ordered_children(idx)
            .into_iter()
            .filter(|child| !seen.contains(child))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|child| self.subtree(child, seen))
            .collect();

        SitemapNode {
            node: self.graph[idx].clone(),
            children,
        }
    }

    // petgraph walks edges newest first
    fn ordered_children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.reverse();
        children
    }
}

/// Number of records discovered at each depth.
pub fn depth_distribution(outcome: &CrawlOutcome) -> BTreeMap<usize, usize> {
    let mut distribution = BTreeMap::new();
    for depth in outcome.registry.iter().filter_map(|r| r.depth) {
        *distribution.entry(depth).or_insert(0) += 1;
    }
    distribution
}
