//! Singleton seeds from nodes not yet covered by any cluster

use crate::cluster::nodeset::NodeSet;
use crate::graph::Graph;
use crate::seeds::{nodes_by_degree, Seed, SeedGenerator};

/// Walks the nodes in decreasing degree order and skips every node that
/// already belongs to a cluster reported through `on_cluster_found`
pub struct UnusedNodesSeedGenerator<'g> {
    graph: &'g Graph,
    order: Vec<usize>,
    position: usize,
    used: Vec<bool>,
}

impl<'g> UnusedNodesSeedGenerator<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            order: nodes_by_degree(graph),
            position: 0,
            used: vec![false; graph.node_count()],
        }
    }

    /// Mark a node as covered so it is never emitted as a seed
    pub fn mark_used(&mut self, node: usize) {
        self.used[node] = true;
    }

    pub fn is_used(&self, node: usize) -> bool {
        self.used[node]
    }

    /// Number of nodes not covered yet
    pub fn unused_count(&self) -> usize {
        self.used.iter().filter(|&&used| !used).count()
    }
}

impl<'g> Iterator for UnusedNodesSeedGenerator<'g> {
    type Item = Seed<'g>;

    fn next(&mut self) -> Option<Seed<'g>> {
        while let Some(&node) = self.order.get(self.position) {
            self.position += 1;
            if !self.is_used(node) {
                return Some(Seed::new(self.graph, vec![node]));
            }
        }
        None
    }
}

impl<'g> SeedGenerator<'g> for UnusedNodesSeedGenerator<'g> {
    fn estimated_count(&self) -> Option<usize> {
        Some(self.order.len())
    }

    fn is_adaptive(&self) -> bool {
        true
    }

    fn on_cluster_found(&mut self, cluster: &NodeSet<'g>) {
        for node in cluster.iter() {
            self.mark_used(node);
        }
    }
}
