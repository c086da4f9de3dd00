//! Immutable node subsets with cached weight totals

use std::cmp::Ordering;
use std::fmt;
use crate::cluster::metrics;
use crate::cluster::quality::QualityFunction;
use crate::graph::{traversal, Direction, Graph};

/// Read access shared by frozen and mutable node sets
pub trait NodeSetView {
    /// Graph the set refers to
    fn graph(&self) -> &Graph;

    /// Member node indices
    fn members(&self) -> &[usize];

    /// Membership test
    fn contains(&self, node: usize) -> bool;

    /// Sum of the weights of edges with both endpoints inside the set
    fn total_internal_edge_weight(&self) -> f64;

    /// Sum of the weights of edges with exactly one endpoint inside the set
    fn total_boundary_edge_weight(&self) -> f64;

    fn size(&self) -> usize {
        self.members().len()
    }

    fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    /// Internal weight relative to the number of member pairs, 0 below two members
    fn density(&self) -> f64 {
        let n = self.size();
        if n < 2 {
            return 0.0;
        }
        2.0 * self.total_internal_edge_weight() / (n * (n - 1)) as f64
    }

    /// Whether the induced subgraph is connected
    fn is_connected(&self) -> bool {
        traversal::is_connected_by(self.graph(), self.members(), |v| self.contains(v))
    }

    /// Whether removing `node` disconnects the induced subgraph
    fn is_cut_vertex(&self, node: usize) -> bool {
        traversal::is_cut_vertex_by(self.graph(), self.members(), node, |v| self.contains(v))
    }
}

/// A frozen subset of graph nodes.
///
/// Members are kept sorted and unique. The optional occurrence values are
/// parallel to the member list and record how many merged clusters contained
/// each member.
#[derive(Clone)]
pub struct NodeSet<'g> {
    graph: &'g Graph,
    members: Vec<usize>,
    internal_weight: f64,
    boundary_weight: f64,
    occurrences: Option<Vec<u32>>,
}

impl<'g> NodeSet<'g> {
    /// Build a set from arbitrary members, scanning the graph for weight totals
    pub fn new<I: IntoIterator<Item = usize>>(graph: &'g Graph, members: I) -> Self {
        let mut members: Vec<usize> = members.into_iter().collect();
        members.sort_unstable();
        members.dedup();

        let mut set = Self {
            graph,
            members,
            internal_weight: 0.0,
            boundary_weight: 0.0,
            occurrences: None,
        };
        set.recalculate();
        set
    }

    /// Build a set from already-sorted members and known totals
    pub(crate) fn from_parts(
        graph: &'g Graph,
        members: Vec<usize>,
        internal_weight: f64,
        boundary_weight: f64,
    ) -> Self {
        Self {
            graph,
            members,
            internal_weight,
            boundary_weight,
            occurrences: None,
        }
    }

    /// Attach occurrence values, one per member in member order
    pub fn with_occurrences(mut self, occurrences: Vec<u32>) -> Self {
        debug_assert_eq!(occurrences.len(), self.members.len());
        self.occurrences = Some(occurrences);
        self
    }

    fn recalculate(&mut self) {
        let mut internal = 0.0;
        let mut boundary = 0.0;

        for &node in &self.members {
            for edge in self.graph.adjacent_edges(node, Direction::All) {
                if self.graph.is_loop(edge) {
                    continue;
                }
                let other = self.graph.edge_endpoint(edge, node);
                let weight = self.graph.edge_weight(edge);
                if self.contains(other) {
                    internal += weight;
                } else {
                    boundary += weight;
                }
            }
        }

        // Internal edges were seen from both endpoints
        self.internal_weight = internal / 2.0;
        self.boundary_weight = boundary;
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied()
    }

    pub fn graph_ref(&self) -> &'g Graph {
        self.graph
    }

    /// Occurrence value of a member, if values were assigned
    pub fn occurrence(&self, node: usize) -> Option<u32> {
        let values = self.occurrences.as_ref()?;
        let pos = self.members.binary_search(&node).ok()?;
        Some(values[pos])
    }

    pub fn occurrences(&self) -> Option<&[u32]> {
        self.occurrences.as_deref()
    }

    /// Score of the set under a quality function
    pub fn quality(&self, function: &dyn QualityFunction) -> f64 {
        function.calculate(self)
    }

    /// Number of members shared with another set
    pub fn intersection_size(&self, other: &NodeSet<'_>) -> usize {
        let (mut i, mut j, mut shared) = (0, 0, 0);
        while i < self.members.len() && j < other.members.len() {
            match self.members[i].cmp(&other.members[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }

    /// Internal and boundary weight of every member, in member order
    pub fn member_weights(&self) -> (Vec<f64>, Vec<f64>) {
        let mut in_weights = Vec::with_capacity(self.members.len());
        let mut out_weights = Vec::with_capacity(self.members.len());

        for &node in &self.members {
            let (mut inside, mut outside) = (0.0, 0.0);
            for edge in self.graph.adjacent_edges(node, Direction::All) {
                if self.graph.is_loop(edge) {
                    continue;
                }
                if self.contains(self.graph.edge_endpoint(edge, node)) {
                    inside += self.graph.edge_weight(edge);
                } else {
                    outside += self.graph.edge_weight(edge);
                }
            }
            in_weights.push(inside);
            out_weights.push(outside);
        }

        (in_weights, out_weights)
    }

    /// One-sided p-value of the members' internal weights exceeding their
    /// boundary weights (Mann-Whitney U test)
    pub fn significance(&self) -> f64 {
        let (in_weights, out_weights) = self.member_weights();
        metrics::mann_whitney_p_value(&in_weights, &out_weights)
    }

    /// Display names of the members
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter()
            .map(|&node| self.graph.display_name(node))
            .collect()
    }
}

impl NodeSetView for NodeSet<'_> {
    fn graph(&self) -> &Graph {
        self.graph
    }

    fn members(&self) -> &[usize] {
        &self.members
    }

    fn contains(&self, node: usize) -> bool {
        self.members.binary_search(&node).is_ok()
    }

    fn total_internal_edge_weight(&self) -> f64 {
        self.internal_weight
    }

    fn total_boundary_edge_weight(&self) -> f64 {
        self.boundary_weight
    }
}

impl PartialEq for NodeSet<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.members == other.members
    }
}

impl Eq for NodeSet<'_> {}

impl fmt::Debug for NodeSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSet")
            .field("members", &self.members)
            .field("internal_weight", &self.internal_weight)
            .field("boundary_weight", &self.boundary_weight)
            .field("occurrences", &self.occurrences)
            .finish()
    }
}
