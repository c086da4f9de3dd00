//! Cluster quality and affinity functions

use crate::cluster::mutable::{ratio, MutableNodeSet};
use crate::cluster::nodeset::NodeSetView;

/// Scores a node set and the sets one node away from it.
///
/// Affinities are derived from the cached weights of a [`MutableNodeSet`],
/// so implementations never rescan the graph.
pub trait QualityFunction: Send + Sync {
    /// Score of the set itself
    fn calculate(&self, set: &dyn NodeSetView) -> f64;

    /// Score of the set after adding `node` (which must not be a member)
    fn addition_affinity(&self, set: &MutableNodeSet<'_>, node: usize) -> f64;

    /// Score of the set after removing `node` (which must be a member)
    fn removal_affinity(&self, set: &MutableNodeSet<'_>, node: usize) -> f64;
}

/// Cohesiveness with a flat penalty per member:
/// `internal / (internal + boundary + size * penalty)`.
///
/// The penalty stands in for undiscovered boundary edges; a penalty of 0
/// gives plain cohesiveness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohesivenessFunction {
    node_penalty: f64,
}

impl CohesivenessFunction {
    pub fn new(node_penalty: f64) -> Self {
        Self { node_penalty }
    }

    pub fn node_penalty(&self) -> f64 {
        self.node_penalty
    }
}

impl Default for CohesivenessFunction {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl QualityFunction for CohesivenessFunction {
    fn calculate(&self, set: &dyn NodeSetView) -> f64 {
        let internal = set.total_internal_edge_weight();
        let boundary = set.total_boundary_edge_weight();
        let penalty = set.size() as f64 * self.node_penalty;
        ratio(internal, internal + boundary + penalty)
    }

    fn addition_affinity(&self, set: &MutableNodeSet<'_>, node: usize) -> f64 {
        let internal = set.total_internal_edge_weight();
        let boundary = set.total_boundary_edge_weight();
        let penalty = (set.size() + 1) as f64 * self.node_penalty;
        ratio(
            internal + set.in_weight(node),
            internal + boundary + set.out_weight(node) + penalty,
        )
    }

    fn removal_affinity(&self, set: &MutableNodeSet<'_>, node: usize) -> f64 {
        let internal = set.total_internal_edge_weight();
        let boundary = set.total_boundary_edge_weight();
        let penalty = set.size().saturating_sub(1) as f64 * self.node_penalty;
        ratio(
            internal - set.in_weight(node),
            internal + boundary - set.out_weight(node) + penalty,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::nodeset::NodeSet;
    use crate::graph::Graph;
    use float_cmp::approx_eq;
    use test_case::test_case;

    fn kite() -> Graph {
        let mut graph = Graph::new(false);
        graph.create_edge(0, 1, 1.0);
        graph.create_edge(1, 2, 1.0);
        graph.create_edge(0, 2, 1.0);
        graph.create_edge(2, 3, 2.0);
        graph.create_edge(3, 4, 0.5);
        graph
    }

    #[test_case(0.0; "no penalty")]
    #[test_case(2.0; "default penalty")]
    #[test_case(0.75; "fractional penalty")]
    fn affinities_equal_quality_of_neighbours(penalty: f64) {
        let graph = kite();
        let function = CohesivenessFunction::new(penalty);
        let set = MutableNodeSet::from_members(&graph, [0, 1, 2]);

        let grown = NodeSet::new(&graph, vec![0, 1, 2, 3]);
        assert!(approx_eq!(
            f64,
            function.addition_affinity(&set, 3),
            function.calculate(&grown),
            epsilon = 1e-12
        ));

        let shrunk = NodeSet::new(&graph, vec![1, 2]);
        assert!(approx_eq!(
            f64,
            function.removal_affinity(&set, 0),
            function.calculate(&shrunk),
            epsilon = 1e-12
        ));
    }

    #[test]
    fn zero_penalty_matches_raw_affinity() {
        let graph = kite();
        let function = CohesivenessFunction::default();
        let set = MutableNodeSet::from_members(&graph, [2, 3]);

        assert_eq!(function.addition_affinity(&set, 4), set.addition_affinity(4));
        assert_eq!(function.removal_affinity(&set, 2), set.removal_affinity(2));
        assert!(approx_eq!(f64, function.calculate(&set), 2.0 / 4.5));
    }

    #[test]
    fn degenerate_sets_score_zero() {
        let mut graph = Graph::new(false);
        graph.create_node(None);
        let function = CohesivenessFunction::default();

        let empty = NodeSet::new(&graph, Vec::new());
        assert_eq!(function.calculate(&empty), 0.0);

        let isolated = MutableNodeSet::from_members(&graph, [0]);
        assert_eq!(function.calculate(&isolated), 0.0);
        assert_eq!(function.removal_affinity(&isolated, 0), 0.0);
    }
}
