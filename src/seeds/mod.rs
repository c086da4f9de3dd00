//! Seed generation strategies
//!
//! A seed generator is an iterator of starting node sets for the growth
//! process. Adaptive generators additionally watch the clusters grown from
//! their seeds and change what they produce next.

pub mod unused;
pub mod file;
pub mod cliques;

use std::cmp::Reverse;
use crate::cluster::mutable::MutableNodeSet;
use crate::cluster::nodeset::{NodeSet, NodeSetView};
use crate::config::SeedMethod;
use crate::error::Result;
use crate::graph::{Direction, Graph};
use crate::progress::HaltFlag;

pub use cliques::CliqueSeedGenerator;
pub use file::FileSeedGenerator;
pub use unused::UnusedNodesSeedGenerator;

/// Initial node set handed to the growth process
#[derive(Debug, Clone)]
pub struct Seed<'g> {
    graph: &'g Graph,
    nodes: Vec<usize>,
}

impl<'g> Seed<'g> {
    pub fn new(graph: &'g Graph, nodes: Vec<usize>) -> Self {
        Self { graph, nodes }
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Working set initialised with the seed nodes
    pub fn to_mutable(&self) -> MutableNodeSet<'g> {
        MutableNodeSet::from_members(self.graph, self.nodes.iter().copied())
    }
}

/// Producer of seeds
pub trait SeedGenerator<'g>: Iterator<Item = Seed<'g>> + Send {
    /// Expected number of seeds, if known in advance
    fn estimated_count(&self) -> Option<usize> {
        None
    }

    /// Whether the generator reacts to `on_cluster_found`
    fn is_adaptive(&self) -> bool {
        false
    }

    /// Notification about a cluster grown from one of the seeds
    fn on_cluster_found(&mut self, _cluster: &NodeSet<'g>) {}
}

/// Boxed generator as returned by [`create`]
pub type BoxedSeedGenerator<'g> = Box<dyn SeedGenerator<'g> + 'g>;

/// Nodes ordered by decreasing degree, ties by increasing index
pub fn nodes_by_degree(graph: &Graph) -> Vec<usize> {
    let mut order: Vec<usize> = (0..graph.node_count()).collect();
    order.sort_by_key(|&node| Reverse(graph.degree(node, Direction::All)));
    order
}

/// One singleton seed per node, highest degree first
pub struct EveryNodeSeedGenerator<'g> {
    graph: &'g Graph,
    order: std::vec::IntoIter<usize>,
    count: usize,
}

impl<'g> EveryNodeSeedGenerator<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        let order = nodes_by_degree(graph);
        Self {
            graph,
            count: order.len(),
            order: order.into_iter(),
        }
    }
}

impl<'g> Iterator for EveryNodeSeedGenerator<'g> {
    type Item = Seed<'g>;

    fn next(&mut self) -> Option<Seed<'g>> {
        let node = self.order.next()?;
        Some(Seed::new(self.graph, vec![node]))
    }
}

impl<'g> SeedGenerator<'g> for EveryNodeSeedGenerator<'g> {
    fn estimated_count(&self) -> Option<usize> {
        Some(self.count)
    }
}

/// One seed per edge containing its two endpoints
pub struct EveryEdgeSeedGenerator<'g> {
    graph: &'g Graph,
    next_edge: usize,
}

impl<'g> EveryEdgeSeedGenerator<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph, next_edge: 0 }
    }
}

impl<'g> Iterator for EveryEdgeSeedGenerator<'g> {
    type Item = Seed<'g>;

    fn next(&mut self) -> Option<Seed<'g>> {
        if self.next_edge >= self.graph.edge_count() {
            return None;
        }

        let (source, target, _) = self.graph.edge(self.next_edge);
        self.next_edge += 1;

        let nodes = if source == target {
            vec![source]
        } else {
            vec![source, target]
        };
        Some(Seed::new(self.graph, nodes))
    }
}

impl<'g> SeedGenerator<'g> for EveryEdgeSeedGenerator<'g> {
    fn estimated_count(&self) -> Option<usize> {
        Some(self.graph.edge_count())
    }
}

/// Seeds taken from an explicit list of node sets
pub struct FixedSeedGenerator<'g> {
    sets: std::vec::IntoIter<NodeSet<'g>>,
    count: usize,
}

impl<'g> FixedSeedGenerator<'g> {
    pub fn new(sets: Vec<NodeSet<'g>>) -> Self {
        Self {
            count: sets.len(),
            sets: sets.into_iter(),
        }
    }
}

impl<'g> Iterator for FixedSeedGenerator<'g> {
    type Item = Seed<'g>;

    fn next(&mut self) -> Option<Seed<'g>> {
        let set = self.sets.next()?;
        Some(Seed::new(set.graph_ref(), set.members().to_vec()))
    }
}

impl<'g> SeedGenerator<'g> for FixedSeedGenerator<'g> {
    fn estimated_count(&self) -> Option<usize> {
        Some(self.count)
    }
}

/// Build the seed generator selected by `method`; `require_connectivity`
/// applies to seed files only
pub fn create<'g>(
    method: &SeedMethod,
    graph: &'g Graph,
    halt: &HaltFlag,
    require_connectivity: bool,
) -> Result<BoxedSeedGenerator<'g>> {
    let generator: BoxedSeedGenerator<'g> = match method {
        SeedMethod::Nodes => Box::new(EveryNodeSeedGenerator::new(graph)),
        SeedMethod::Edges => Box::new(EveryEdgeSeedGenerator::new(graph)),
        SeedMethod::UnusedNodes => Box::new(UnusedNodesSeedGenerator::new(graph)),
        SeedMethod::Cliques => Box::new(CliqueSeedGenerator::with_halt(
            graph,
            cliques::DEFAULT_MIN_CLIQUE_SIZE,
            halt.clone(),
        )),
        SeedMethod::File(path) => Box::new(FileSeedGenerator::from_path(
            graph,
            path,
            require_connectivity,
        )?),
    };
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn star_and_pair() -> Graph {
        let mut graph = Graph::new(false);
        graph.create_unit_edge(3, 0);
        graph.create_unit_edge(3, 1);
        graph.create_unit_edge(3, 2);
        graph.create_unit_edge(4, 5);
        graph
    }

    #[test]
    fn every_node_orders_by_degree() {
        let graph = star_and_pair();
        let generator = EveryNodeSeedGenerator::new(&graph);
        assert_eq!(generator.estimated_count(), Some(6));

        let seeds: Vec<Vec<usize>> = generator.map(|s| s.nodes().to_vec()).collect();
        assert_eq!(seeds, vec![vec![3], vec![0], vec![1], vec![2], vec![4], vec![5]]);
    }

    #[test]
    fn every_edge_yields_endpoints() {
        let mut graph = star_and_pair();
        graph.create_unit_edge(5, 5);

        let seeds: Vec<Vec<usize>> = EveryEdgeSeedGenerator::new(&graph)
            .map(|s| s.nodes().to_vec())
            .collect();
        assert_eq!(seeds, vec![vec![3, 0], vec![3, 1], vec![3, 2], vec![4, 5], vec![5]]);
    }

    #[test]
    fn fixed_seeds_pass_through() {
        let graph = star_and_pair();
        let sets = vec![NodeSet::new(&graph, vec![1, 3]), NodeSet::new(&graph, vec![5])];

        let mut generator = FixedSeedGenerator::new(sets);
        assert_eq!(generator.estimated_count(), Some(2));
        assert!(!generator.is_adaptive());

        let first = generator.next().map(|s| s.to_mutable());
        assert_eq!(first.map(|set| set.size()), Some(2));
        assert_eq!(generator.next().map(|s| s.len()), Some(1));
        assert!(generator.next().is_none());
    }

    #[test]
    fn factory_builds_named_generators() {
        let graph = star_and_pair();
        let halt = HaltFlag::new();

        let nodes = create(&SeedMethod::Nodes, &graph, &halt, false).map(|g| g.count()).ok();
        assert_eq!(nodes, Some(6));

        let unused = create(&SeedMethod::UnusedNodes, &graph, &halt, false).map(|g| g.is_adaptive()).ok();
        assert_eq!(unused, Some(true));

        let missing = create(&SeedMethod::File("/nonexistent/seeds.txt".into()), &graph, &halt, false);
        assert!(missing.is_err());
    }

    #[test]
    fn factory_passes_connectivity_to_seed_files() {
        let mut builder = GraphBuilder::new(false);
        builder.add_edge("a", "b", 1.0);
        builder.add_edge("b", "c", 1.0);
        let graph = builder.build();

        let path = std::env::temp_dir()
            .join(format!("cluster-one-seeds-{}.txt", std::process::id()));
        std::fs::write(&path, "a c\nb\n").expect("writable temp dir");
        let method = SeedMethod::File(path.clone());
        let halt = HaltFlag::new();

        let seeds_of = |connected: bool| -> Vec<Vec<usize>> {
            create(&method, &graph, &halt, connected)
                .map(|g| g.map(|s| s.nodes().to_vec()).collect())
                .unwrap_or_default()
        };
        let loose = seeds_of(false);
        let pooled = seeds_of(true);
        let _ = std::fs::remove_file(&path);

        assert_eq!(loose, vec![vec![0, 2], vec![1]]);
        assert_eq!(pooled, vec![vec![0, 1, 2]]);
    }
}
