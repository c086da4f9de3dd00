//! Merging of highly overlapping clusters
//!
//! Clusters become nodes of a meta-graph, linked whenever their similarity
//! reaches the threshold. Every connected component of the meta-graph with
//! more than one cluster is replaced by the union of its clusters.

use std::collections::{BTreeMap, HashMap};
use rayon::prelude::*;
use crate::cluster::metrics::SimilarityFunction;
use crate::cluster::nodeset::{NodeSet, NodeSetView};
use crate::graph::{traversal, Graph};
use crate::progress::{HaltFlag, NullProgress, ProgressMonitor};

/// Single-pass overlap merger
#[derive(Debug, Clone)]
pub struct OverlapMerger {
    similarity: SimilarityFunction,
    threshold: f64,
    halt: HaltFlag,
}

impl OverlapMerger {
    pub fn new(similarity: SimilarityFunction, threshold: f64) -> Self {
        Self {
            similarity,
            threshold,
            halt: HaltFlag::new(),
        }
    }

    /// Stop comparing clusters once `halt` is raised
    pub fn with_halt(mut self, halt: HaltFlag) -> Self {
        self.halt = halt;
        self
    }

    /// Pairs `(i, j)` with `i < j` whose similarity reaches the threshold.
    ///
    /// With a positive threshold only clusters sharing at least one member
    /// can qualify; otherwise every pair does, disjoint ones included.
    pub fn similar_pairs(&self, clusters: &[NodeSet<'_>]) -> Vec<(usize, usize)> {
        if self.threshold <= 0.0 {
            return self.all_pairs(clusters.len());
        }

        let mut index: HashMap<usize, Vec<usize>> = HashMap::new();
        for (idx, cluster) in clusters.iter().enumerate() {
            for node in cluster.iter() {
                index.entry(node).or_default().push(idx);
            }
        }

        let mut pairs: Vec<(usize, usize)> = (0..clusters.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                if self.halt.is_requested() {
                    return Vec::new();
                }

                // BTreeMap keeps the per-row output ordered
                let mut shared: BTreeMap<usize, usize> = BTreeMap::new();
                for node in clusters[i].iter() {
                    for &j in &index[&node] {
                        if j > i {
                            *shared.entry(j).or_insert(0) += 1;
                        }
                    }
                }

                shared.into_iter()
                    .filter(|&(j, count)| {
                        let score = self.similarity.from_counts(
                            count,
                            clusters[i].size(),
                            clusters[j].size(),
                        );
                        score >= self.threshold
                    })
                    .map(|(j, _)| (i, j))
                    .collect::<Vec<_>>()
            })
            .collect();

        pairs.sort_unstable();
        pairs
    }

    fn all_pairs(&self, count: usize) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = (0..count)
            .into_par_iter()
            .flat_map_iter(|i| {
                let first = if self.halt.is_requested() { count } else { i + 1 };
                (first..count).map(move |j| (i, j))
            })
            .collect();

        pairs.sort_unstable();
        pairs
    }

    /// Merge overlapping clusters
    pub fn merge<'g>(&self, clusters: Vec<NodeSet<'g>>) -> Vec<NodeSet<'g>> {
        self.merge_with_progress(clusters, &NullProgress)
    }

    /// Merge overlapping clusters, reporting progress
    pub fn merge_with_progress<'g>(
        &self,
        clusters: Vec<NodeSet<'g>>,
        progress: &dyn ProgressMonitor,
    ) -> Vec<NodeSet<'g>> {
        let Some(graph) = clusters.first().map(|c| c.graph_ref()) else {
            return clusters;
        };

        progress.set_status("Finding highly overlapping clusters...");
        progress.set_percent_completed(-1);
        let pairs = self.similar_pairs(&clusters);
        log::debug!(
            "Found {} cluster pairs with {} similarity >= {}",
            pairs.len(),
            self.similarity,
            self.threshold
        );

        let mut meta = Graph::with_capacity(false, clusters.len(), pairs.len());
        for _ in 0..clusters.len() {
            meta.create_node(None);
        }
        for &(i, j) in &pairs {
            meta.create_unit_edge(i, j);
        }

        progress.set_status("Merging highly overlapping clusters...");
        let components = traversal::connected_components(&meta);
        let total = components.len().max(1);

        let mut slots: Vec<Option<NodeSet<'g>>> = clusters.into_iter().map(Some).collect();
        let mut merged = Vec::with_capacity(components.len());

        for (done, component) in components.into_iter().enumerate() {
            if component.len() == 1 {
                if let Some(cluster) = slots[component[0]].take() {
                    merged.push(cluster);
                }
            } else {
                let parts: Vec<NodeSet<'g>> = component.iter()
                    .filter_map(|&idx| slots[idx].take())
                    .collect();
                merged.push(union_with_occurrences(graph, &parts));
            }
            progress.set_percent_completed((100 * (done + 1) / total) as i32);
        }

        merged
    }
}

/// Union of several sets; each member's occurrence value counts how many of
/// the parts contained it
fn union_with_occurrences<'g>(graph: &'g Graph, parts: &[NodeSet<'g>]) -> NodeSet<'g> {
    let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
    for part in parts {
        for node in part.iter() {
            *counts.entry(node).or_insert(0) += 1;
        }
    }

    let occurrences: Vec<u32> = counts.values().copied().collect();
    NodeSet::new(graph, counts.into_keys()).with_occurrences(occurrences)
}
