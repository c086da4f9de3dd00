//! Seeds read from a text stream, one seed per line
//!
//! Each line lists node names separated by whitespace. Names missing from
//! the graph are skipped. A line consisting of a single `*` asks for every
//! node not covered by a cluster to be used as a singleton seed once the
//! listed seeds are exhausted.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use crate::cluster::nodeset::NodeSet;
use crate::error::Result;
use crate::graph::{traversal, Graph};
use crate::seeds::{Seed, SeedGenerator, UnusedNodesSeedGenerator};

/// Line requesting the unused-node fallback
pub const UNUSED_NODES_SENTINEL: &str = "*";

pub struct FileSeedGenerator<'g> {
    graph: &'g Graph,
    seeds: std::vec::IntoIter<Vec<usize>>,
    count: usize,
    fallback: Option<UnusedNodesSeedGenerator<'g>>,
}

impl<'g> FileSeedGenerator<'g> {
    /// Read seeds from a file
    pub fn from_path<P: AsRef<Path>>(
        graph: &'g Graph,
        path: P,
        require_connectivity: bool,
    ) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        log::info!("Reading seeds from {}", path.as_ref().display());
        Self::from_reader(graph, BufReader::new(file), require_connectivity)
    }

    /// Read seeds from any buffered reader.
    ///
    /// With `require_connectivity`, consecutive lines are pooled until the
    /// pooled nodes induce a connected subgraph, and the pool becomes one seed.
    pub fn from_reader<R: BufRead>(
        graph: &'g Graph,
        reader: R,
        require_connectivity: bool,
    ) -> Result<Self> {
        let mut seeds = Vec::new();
        let mut pending: BTreeSet<usize> = BTreeSet::new();
        let mut use_unused = false;
        let mut unknown = 0usize;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == UNUSED_NODES_SENTINEL {
                use_unused = true;
                continue;
            }

            let mut nodes: Vec<usize> = Vec::new();
            for name in line.split_whitespace() {
                match graph.find_node(name) {
                    Some(node) => nodes.push(node),
                    None => unknown += 1,
                }
            }
            if nodes.is_empty() {
                continue;
            }

            if require_connectivity {
                pending.extend(nodes);
                let pooled: Vec<usize> = pending.iter().copied().collect();
                if traversal::is_connected(graph, &pooled) {
                    seeds.push(pooled);
                    pending.clear();
                }
            } else {
                nodes.sort_unstable();
                nodes.dedup();
                seeds.push(nodes);
            }
        }

        if unknown > 0 {
            log::warn!("Ignored {} unknown node names in seed input", unknown);
        }
        if !pending.is_empty() {
            log::warn!(
                "Discarded {} trailing seed nodes that never formed a connected set",
                pending.len()
            );
        }

        Ok(Self {
            graph,
            count: seeds.len(),
            seeds: seeds.into_iter(),
            fallback: use_unused.then(|| UnusedNodesSeedGenerator::new(graph)),
        })
    }

    /// Whether uncovered nodes follow the listed seeds
    pub fn uses_unused_nodes(&self) -> bool {
        self.fallback.is_some()
    }
}

impl<'g> Iterator for FileSeedGenerator<'g> {
    type Item = Seed<'g>;

    fn next(&mut self) -> Option<Seed<'g>> {
        if let Some(nodes) = self.seeds.next() {
            return Some(Seed::new(self.graph, nodes));
        }
        self.fallback.as_mut()?.next()
    }
}

impl<'g> SeedGenerator<'g> for FileSeedGenerator<'g> {
    fn estimated_count(&self) -> Option<usize> {
        match &self.fallback {
            Some(fallback) => Some(self.count + fallback.unused_count()),
            None => Some(self.count),
        }
    }

    fn is_adaptive(&self) -> bool {
        self.fallback.is_some()
    }

    fn on_cluster_found(&mut self, cluster: &NodeSet<'g>) {
        if let Some(fallback) = self.fallback.as_mut() {
            fallback.on_cluster_found(cluster);
        }
    }
}
