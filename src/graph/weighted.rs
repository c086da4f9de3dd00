//! Append-only weighted graph with dense node and edge indices

use std::collections::HashMap;
use itertools::Either;
use serde::{Serialize, Deserialize};

/// Edge direction relative to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Edges leaving the node
    Out,
    /// Edges entering the node
    In,
    /// Every incident edge
    All,
}

/// Weighted graph stored as flat edge arrays plus per-node adjacency indices.
///
/// Nodes and edges are identified by their position in the arrays and those
/// positions never change. For undirected graphs each edge appears in the
/// adjacency list of both endpoints (once for a self-loop), so the three
/// directions are interchangeable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Whether edges have a direction
    directed: bool,

    /// Optional node names, indexed by node
    names: Vec<Option<String>>,

    /// Reverse lookup for named nodes
    name_index: HashMap<String, usize>,

    /// Edge source endpoints
    sources: Vec<usize>,

    /// Edge target endpoints
    targets: Vec<usize>,

    /// Edge weights
    weights: Vec<f64>,

    /// Outgoing (or all, if undirected) incident edges per node
    out_adj: Vec<Vec<usize>>,

    /// Incoming incident edges per node (directed graphs only)
    in_adj: Vec<Vec<usize>>,
}

impl Graph {
    /// Create an empty graph
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            ..Self::default()
        }
    }

    /// Create an empty graph with pre-allocated capacity
    pub fn with_capacity(directed: bool, node_count: usize, edge_count: usize) -> Self {
        Self {
            directed,
            names: Vec::with_capacity(node_count),
            name_index: HashMap::with_capacity(node_count),
            sources: Vec::with_capacity(edge_count),
            targets: Vec::with_capacity(edge_count),
            weights: Vec::with_capacity(edge_count),
            out_adj: Vec::with_capacity(node_count),
            in_adj: Vec::with_capacity(node_count),
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    /// Append a node and return its index
    pub fn create_node(&mut self, name: Option<&str>) -> usize {
        let index = self.names.len();
        if let Some(name) = name {
            self.name_index.entry(name.to_string()).or_insert(index);
        }
        self.names.push(name.map(str::to_string));
        self.out_adj.push(Vec::new());
        self.in_adj.push(Vec::new());
        index
    }

    /// Grow the node set until `node` is a valid index
    fn ensure_node(&mut self, node: usize) {
        while self.names.len() <= node {
            self.create_node(None);
        }
    }

    /// Append an edge and return its index.
    ///
    /// Endpoints beyond the current node count implicitly create the missing
    /// (unnamed) nodes.
    pub fn create_edge(&mut self, source: usize, target: usize, weight: f64) -> usize {
        self.ensure_node(source.max(target));

        let index = self.weights.len();
        self.sources.push(source);
        self.targets.push(target);
        self.weights.push(weight);

        self.out_adj[source].push(index);
        if self.directed {
            self.in_adj[target].push(index);
        } else if source != target {
            self.out_adj[target].push(index);
        }

        index
    }

    /// Append an edge of default weight 1.0
    pub fn create_unit_edge(&mut self, source: usize, target: usize) -> usize {
        self.create_edge(source, target, 1.0)
    }

    /// Incident edges of a node in the given direction
    pub fn adjacent_edges(
        &self,
        node: usize,
        direction: Direction,
    ) -> impl Iterator<Item = usize> + '_ {
        let out = self.out_adj[node].iter().copied();
        if !self.directed {
            return Either::Left(out);
        }

        let incoming = self.in_adj[node].iter().copied();
        match direction {
            Direction::Out => Either::Left(out),
            Direction::In => Either::Right(Either::Left(incoming)),
            Direction::All => Either::Right(Either::Right(out.chain(incoming))),
        }
    }

    /// Nodes reachable over one incident edge, repeated for parallel edges
    pub fn neighbors(&self, node: usize, direction: Direction) -> impl Iterator<Item = usize> + '_ {
        self.adjacent_edges(node, direction)
            .map(move |edge| self.edge_endpoint(edge, node))
    }

    /// Number of incident edges in the given direction
    pub fn degree(&self, node: usize, direction: Direction) -> usize {
        if !self.directed {
            return self.out_adj[node].len();
        }
        match direction {
            Direction::Out => self.out_adj[node].len(),
            Direction::In => self.in_adj[node].len(),
            Direction::All => self.out_adj[node].len() + self.in_adj[node].len(),
        }
    }

    /// Total weight of the non-loop edges incident on a node
    pub fn strength(&self, node: usize) -> f64 {
        self.adjacent_edges(node, Direction::All)
            .filter(|&edge| !self.is_loop(edge))
            .map(|edge| self.weights[edge])
            .sum()
    }

    /// Endpoint of `edge` opposite to `known`
    pub fn edge_endpoint(&self, edge: usize, known: usize) -> usize {
        if self.sources[edge] == known {
            self.targets[edge]
        } else {
            self.sources[edge]
        }
    }

    pub fn edge(&self, edge: usize) -> (usize, usize, f64) {
        (self.sources[edge], self.targets[edge], self.weights[edge])
    }

    pub fn edge_weight(&self, edge: usize) -> f64 {
        self.weights[edge]
    }

    pub fn is_loop(&self, edge: usize) -> bool {
        self.sources[edge] == self.targets[edge]
    }

    /// Iterate over `(source, target, weight)` for every edge in index order
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.sources
            .iter()
            .zip(&self.targets)
            .zip(&self.weights)
            .map(|((&s, &t), &w)| (s, t, w))
    }

    pub fn node_name(&self, node: usize) -> Option<&str> {
        self.names[node].as_deref()
    }

    /// Name of a node, falling back to its index
    pub fn display_name(&self, node: usize) -> String {
        match self.node_name(node) {
            Some(name) => name.to_string(),
            None => node.to_string(),
        }
    }

    /// Look up a node by name
    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// Whether every edge carries the default weight
    pub fn has_uniform_weights(&self) -> bool {
        self.weights.iter().all(|&w| w == 1.0)
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let edges = self.weights.capacity() * (2 * size_of::<usize>() + size_of::<f64>());
        let adjacency: usize = self.out_adj.iter()
            .chain(&self.in_adj)
            .map(|list| list.capacity() * size_of::<usize>())
            .sum();
        let names: usize = self.names.iter()
            .flatten()
            .map(|s| s.capacity())
            .sum();

        size_of::<Self>() + edges + adjacency + names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_extend_node_count() {
        let mut graph = Graph::new(false);
        graph.create_node(Some("a"));
        let edge = graph.create_edge(0, 4, 2.5);

        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge(edge), (0, 4, 2.5));
        assert_eq!(graph.edge_endpoint(edge, 0), 4);
        assert_eq!(graph.edge_endpoint(edge, 4), 0);
        assert_eq!(graph.find_node("a"), Some(0));
        assert_eq!(graph.node_name(3), None);
        assert_eq!(graph.display_name(3), "3");
    }

    #[test]
    fn undirected_directions_are_equivalent() {
        let mut graph = Graph::new(false);
        graph.create_unit_edge(0, 1);
        graph.create_unit_edge(1, 2);

        for direction in [Direction::Out, Direction::In, Direction::All] {
            let edges: Vec<usize> = graph.adjacent_edges(1, direction).collect();
            assert_eq!(edges, vec![0, 1]);
        }
        assert_eq!(graph.degree(1, Direction::In), 2);
    }

    #[test]
    fn directed_adjacency() {
        let mut graph = Graph::new(true);
        graph.create_unit_edge(0, 1);
        graph.create_unit_edge(2, 1);
        graph.create_unit_edge(1, 2);

        assert_eq!(graph.adjacent_edges(1, Direction::Out).collect::<Vec<_>>(), vec![2]);
        assert_eq!(graph.adjacent_edges(1, Direction::In).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(graph.degree(1, Direction::All), 3);
        assert_eq!(graph.neighbors(1, Direction::In).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn self_loops_do_not_count_towards_strength() {
        let mut graph = Graph::new(false);
        graph.create_edge(0, 0, 5.0);
        graph.create_edge(0, 1, 2.0);

        assert_eq!(graph.degree(0, Direction::All), 2);
        assert_eq!(graph.strength(0), 2.0);
        assert!(!graph.has_uniform_weights());
    }
}
