//! Node set with incrementally maintained weight bookkeeping
//!
//! For every node `v` of the graph the set tracks two accumulators:
//!
//! - `in_weight[v]`: weight of the edges between `v` and the members
//!   (excluding `v` itself),
//! - `out_weight[v]`: weight of the edges between `v` and the non-members.
//!
//! Their sum is always the total non-loop weight incident on `v`, so adding
//! or removing a node only has to shift weight between the two arrays for
//! the node's neighbours. Self-loops never contribute to either side.

use crate::cluster::nodeset::{NodeSet, NodeSetView};
use crate::graph::{Direction, Graph};

#[derive(Debug, Clone)]
pub struct MutableNodeSet<'g> {
    graph: &'g Graph,

    /// Members in insertion order (reordered by removals)
    members: Vec<usize>,

    /// Position of each node in `members`, if it is a member
    slots: Vec<Option<usize>>,

    in_weight: Vec<f64>,
    out_weight: Vec<f64>,

    total_internal: f64,
    total_boundary: f64,
}

impl<'g> MutableNodeSet<'g> {
    /// Create an empty set over the given graph
    pub fn new(graph: &'g Graph) -> Self {
        let n = graph.node_count();
        let mut set = Self {
            graph,
            members: Vec::new(),
            slots: vec![None; n],
            in_weight: vec![0.0; n],
            out_weight: vec![0.0; n],
            total_internal: 0.0,
            total_boundary: 0.0,
        };
        set.clear();
        set
    }

    /// Create a set initialised with the given members
    pub fn from_members<I: IntoIterator<Item = usize>>(graph: &'g Graph, members: I) -> Self {
        let mut set = Self::new(graph);
        for node in members {
            set.add(node);
        }
        set
    }

    /// Add a node; returns false if it was already a member
    pub fn add(&mut self, node: usize) -> bool {
        if self.slots[node].is_some() {
            return false;
        }

        self.total_internal += self.in_weight[node];
        self.total_boundary += self.out_weight[node] - self.in_weight[node];

        for edge in self.graph.adjacent_edges(node, Direction::All) {
            if self.graph.is_loop(edge) {
                continue;
            }
            let other = self.graph.edge_endpoint(edge, node);
            let weight = self.graph.edge_weight(edge);
            self.in_weight[other] += weight;
            self.out_weight[other] -= weight;
        }

        self.slots[node] = Some(self.members.len());
        self.members.push(node);
        true
    }

    /// Remove a node; returns false if it was not a member
    pub fn remove(&mut self, node: usize) -> bool {
        let Some(pos) = self.slots[node] else {
            return false;
        };

        self.total_internal -= self.in_weight[node];
        self.total_boundary += self.in_weight[node] - self.out_weight[node];

        for edge in self.graph.adjacent_edges(node, Direction::All) {
            if self.graph.is_loop(edge) {
                continue;
            }
            let other = self.graph.edge_endpoint(edge, node);
            let weight = self.graph.edge_weight(edge);
            self.in_weight[other] -= weight;
            self.out_weight[other] += weight;
        }

        self.members.swap_remove(pos);
        if let Some(&moved) = self.members.get(pos) {
            self.slots[moved] = Some(pos);
        }
        self.slots[node] = None;
        true
    }

    /// Remove every member and rebuild the accumulators from the edge list
    pub fn clear(&mut self) {
        for &node in &self.members {
            self.slots[node] = None;
        }
        self.members.clear();
        self.total_internal = 0.0;
        self.total_boundary = 0.0;

        self.in_weight.iter_mut().for_each(|w| *w = 0.0);
        self.out_weight.iter_mut().for_each(|w| *w = 0.0);

        for (source, target, weight) in self.graph.edges() {
            if source == target {
                continue;
            }
            self.out_weight[source] += weight;
            self.out_weight[target] += weight;
        }
    }

    /// Weight of the edges between `node` and the members
    pub fn in_weight(&self, node: usize) -> f64 {
        self.in_weight[node]
    }

    /// Weight of the edges between `node` and the non-members
    pub fn out_weight(&self, node: usize) -> f64 {
        self.out_weight[node]
    }

    /// Cohesiveness (without node penalty) the set would have after adding `node`
    pub fn addition_affinity(&self, node: usize) -> f64 {
        let numerator = self.total_internal + self.in_weight[node];
        let denominator = self.total_internal + self.total_boundary + self.out_weight[node];
        ratio(numerator, denominator)
    }

    /// Cohesiveness (without node penalty) the set would have after removing `node`
    pub fn removal_affinity(&self, node: usize) -> f64 {
        let numerator = self.total_internal - self.in_weight[node];
        let denominator = self.total_internal + self.total_boundary - self.out_weight[node];
        ratio(numerator, denominator)
    }

    /// Non-members adjacent to at least one member, without duplicates
    pub fn external_boundary_nodes(&self) -> Vec<usize> {
        let mut seen = std::collections::HashSet::new();
        let mut boundary = Vec::new();

        for &node in &self.members {
            for neighbor in self.graph.neighbors(node, Direction::All) {
                if self.slots[neighbor].is_none() && seen.insert(neighbor) {
                    boundary.push(neighbor);
                }
            }
        }

        boundary
    }

    /// Snapshot the current state as an immutable set
    pub fn freeze(&self) -> NodeSet<'g> {
        let mut members = self.members.clone();
        members.sort_unstable();
        NodeSet::from_parts(self.graph, members, self.total_internal, self.total_boundary)
    }

    pub fn graph_ref(&self) -> &'g Graph {
        self.graph
    }
}

/// Quotient that maps degenerate denominators to 0
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    numerator / denominator
}

impl NodeSetView for MutableNodeSet<'_> {
    fn graph(&self) -> &Graph {
        self.graph
    }

    fn members(&self) -> &[usize] {
        &self.members
    }

    fn contains(&self, node: usize) -> bool {
        self.slots.get(node).map_or(false, |slot| slot.is_some())
    }

    fn total_internal_edge_weight(&self) -> f64 {
        self.total_internal
    }

    fn total_boundary_edge_weight(&self) -> f64 {
        self.total_boundary
    }
}
