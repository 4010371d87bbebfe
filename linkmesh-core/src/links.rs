use crate::model::LinkEdge;
use std::collections::{HashMap, HashSet};

/// Existing internal links, reduced to what the scorers need
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    outlinks: HashMap<String, usize>,
    existing: HashSet<(String, String)>,
    edge_count: usize,
}

impl LinkGraph {
    pub fn from_edges(edges: &[LinkEdge]) -> Self {
        let mut graph = LinkGraph::default();
        for edge in edges {
            // Every exported row counts, the same link repeated in a menu included
            *graph.outlinks.entry(edge.source.clone()).or_insert(0) += 1;
            graph
                .existing
                .insert((edge.source.clone(), edge.destination.clone()));
        }
        graph.edge_count = edges.len();
        graph
    }

    /// Outgoing links recorded for `url`, 0 when unknown
    pub fn outlinks(&self, url: &str) -> usize {
        self.outlinks.get(url).copied().unwrap_or(0)
    }

    pub fn contains(&self, source: &str, destination: &str) -> bool {
        self.existing
            .contains(&(source.to_string(), destination.to_string()))
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }
}
