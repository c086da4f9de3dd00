//! Graph construction from named endpoints

use crate::graph::Graph;

/// Builder for incrementally constructing a Graph keyed by node names
pub struct GraphBuilder {
    /// Graph under construction
    graph: Graph,

    /// Number of self-loops seen while building
    loops: usize,
}

impl GraphBuilder {
    /// Create a new graph builder
    pub fn new(directed: bool) -> Self {
        Self {
            graph: Graph::new(directed),
            loops: 0,
        }
    }

    /// Create a new graph builder with the given node capacity
    pub fn with_capacity(directed: bool, capacity: usize) -> Self {
        Self {
            graph: Graph::with_capacity(directed, capacity, capacity * 4),
            loops: 0,
        }
    }

    /// Get or create a node index for the given name
    pub fn get_or_create_node(&mut self, name: &str) -> usize {
        if let Some(idx) = self.graph.find_node(name) {
            return idx;
        }
        self.graph.create_node(Some(name))
    }

    /// Add a weighted edge between two named nodes
    pub fn add_edge(&mut self, src: &str, dst: &str, weight: f64) -> usize {
        let src_idx = self.get_or_create_node(src);
        let dst_idx = self.get_or_create_node(dst);

        if src_idx == dst_idx {
            self.loops += 1;
        }

        self.graph.create_edge(src_idx, dst_idx, weight)
    }

    /// Number of nodes created so far
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Finish construction
    pub fn build(self) -> Graph {
        if self.loops > 0 {
            log::debug!("Graph contains {} self-loops; they are ignored by clustering", self.loops);
        }
        self.graph
    }
}
