//! Cluster detection driver
//!
//! Seeds are grown one by one into locally optimal clusters, filtered,
//! merged when they overlap too much and filtered once more. Growth runs on
//! the rayon pool unless the seed generator needs to see each result before
//! producing the next seed.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicUsize, Ordering};
use rayon::prelude::*;
use crate::cluster::growth::{GreedyGrowthProcess, GrowthOptions};
use crate::cluster::merge::OverlapMerger;
use crate::cluster::metrics;
use crate::cluster::nodeset::{NodeSet, NodeSetView};
use crate::cluster::quality::{CohesivenessFunction, QualityFunction};
use crate::config::{ClusterParams, MergingMethod};
use crate::error::Result;
use crate::graph::Graph;
use crate::progress::{HaltFlag, NullProgress, ProgressMonitor};
use crate::seeds::{self, BoxedSeedGenerator, Seed};

/// Overlapping cluster detection with greedy cohesiveness growth
pub struct ClusterOne {
    params: ClusterParams,
    quality: CohesivenessFunction,
    halt: HaltFlag,
    progress: Box<dyn ProgressMonitor>,
}

impl ClusterOne {
    /// Validate `params` and set up a detector
    pub fn new(mut params: ClusterParams) -> Result<Self> {
        params.validate()?;
        let quality = CohesivenessFunction::new(params.node_penalty);

        Ok(Self {
            params,
            quality,
            halt: HaltFlag::new(),
            progress: Box::new(NullProgress),
        })
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressMonitor>) -> Self {
        self.progress = progress;
        self
    }

    /// Share a cancellation flag with the caller
    pub fn with_halt(mut self, halt: HaltFlag) -> Self {
        self.halt = halt;
        self
    }

    pub fn halt_flag(&self) -> HaltFlag {
        self.halt.clone()
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    pub fn quality_function(&self) -> &CohesivenessFunction {
        &self.quality
    }

    /// Detect clusters using the configured seed method
    pub fn run<'g>(&self, graph: &'g Graph) -> Result<Vec<NodeSet<'g>>> {
        let generator = seeds::create(
            &self.params.seed_method,
            graph,
            &self.halt,
            self.params.require_connected_seeds,
        )?;
        Ok(self.run_with_seeds(graph, generator))
    }

    /// Detect clusters grown from the given seeds
    pub fn run_with_seeds<'g>(
        &self,
        graph: &'g Graph,
        generator: BoxedSeedGenerator<'g>,
    ) -> Vec<NodeSet<'g>> {
        let options = self.params.growth_options(graph);
        log::info!(
            "Clustering graph with {} nodes and {} edges (min density {:.3}, penalty {})",
            graph.node_count(),
            graph.edge_count(),
            options.min_density,
            self.quality.node_penalty()
        );

        self.progress.set_status("Growing clusters from seeds...");
        let grown = if generator.is_adaptive() {
            self.grow_sequentially(generator, options)
        } else {
            self.grow_in_parallel(generator, options)
        };
        log::info!("Grew {} candidate clusters", grown.len());

        if self.halt.is_requested() {
            log::warn!("Clustering halted; skipping the merge step");
            return self.finish(grown, options.min_density);
        }

        let merged = self.merge(grown);
        log::info!("{} clusters left after merging", merged.len());

        self.finish(merged, options.min_density)
    }

    /// Grow one seed to convergence and apply the optional post-passes
    pub fn grow_seed<'g>(&self, seed: &Seed<'g>, options: GrowthOptions) -> NodeSet<'g> {
        let mut set = seed.to_mutable();
        GreedyGrowthProcess::new(&mut set, &self.quality, options).run();

        if self.params.haircut_threshold > 0.0 {
            metrics::haircut(&mut set, self.params.haircut_threshold);
        }
        if self.params.fluff_clusters {
            metrics::fluff(&mut set);
        }

        set.freeze()
    }

    /// Adaptive generators see every cluster before yielding the next seed
    fn grow_sequentially<'g>(
        &self,
        mut generator: BoxedSeedGenerator<'g>,
        options: GrowthOptions,
    ) -> Vec<NodeSet<'g>> {
        let total = generator.estimated_count();
        let mut clusters = Vec::new();
        let mut processed = 0;

        while let Some(seed) = generator.next() {
            if self.halt.is_requested() {
                log::warn!("Halt requested after {} seeds", processed);
                break;
            }

            let cluster = self.grow_seed(&seed, options);
            generator.on_cluster_found(&cluster);

            processed += 1;
            self.report_progress(processed, total);

            if self.is_candidate(&cluster) {
                clusters.push(cluster);
            }
        }

        log::debug!("Processed {} seeds sequentially", processed);
        clusters
    }

    fn grow_in_parallel<'g>(
        &self,
        generator: BoxedSeedGenerator<'g>,
        options: GrowthOptions,
    ) -> Vec<NodeSet<'g>> {
        let total = generator.estimated_count();
        let processed = AtomicUsize::new(0);

        let clusters: Vec<NodeSet<'g>> = generator
            .par_bridge()
            .filter(|_| !self.halt.is_requested())
            .map(|seed| {
                let cluster = self.grow_seed(&seed, options);
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                self.report_progress(done, total);
                cluster
            })
            .filter(|cluster| self.is_candidate(cluster))
            .collect();

        log::debug!("Processed {} seeds in parallel", processed.load(Ordering::Relaxed));
        clusters
    }

    /// Size and k-core filter applied right after growth
    fn is_candidate(&self, cluster: &NodeSet<'_>) -> bool {
        if cluster.size() < self.params.min_size {
            return false;
        }
        self.params.k_core_threshold == 0
            || metrics::has_k_core(cluster, self.params.k_core_threshold)
    }

    fn merge<'g>(&self, clusters: Vec<NodeSet<'g>>) -> Vec<NodeSet<'g>> {
        match self.params.merging_method {
            MergingMethod::Single => {}
            // Rejected by validation
            MergingMethod::Multi => log::debug!("Multi-pass merging unavailable; merging once"),
        }

        OverlapMerger::new(self.params.similarity, self.params.overlap_threshold)
            .with_halt(self.halt.clone())
            .merge_with_progress(clusters, self.progress.as_ref())
    }

    /// Final density and size filter, largest and best clusters first
    fn finish<'g>(&self, clusters: Vec<NodeSet<'g>>, min_density: f64) -> Vec<NodeSet<'g>> {
        let before = clusters.len();
        let mut scored: Vec<(f64, NodeSet<'g>)> = clusters
            .into_iter()
            .filter(|c| c.size() >= self.params.min_size && c.density() >= min_density)
            .map(|c| (c.quality(&self.quality), c))
            .collect();

        scored.sort_by(|(qa, a), (qb, b)| {
            b.size()
                .cmp(&a.size())
                .then_with(|| qb.partial_cmp(qa).unwrap_or(CmpOrdering::Equal))
                .then_with(|| a.members().cmp(b.members()))
        });

        log::info!(
            "Kept {} of {} clusters with density >= {:.3} and size >= {}",
            scored.len(),
            before,
            min_density,
            self.params.min_size
        );
        self.progress.set_percent_completed(100);

        scored.into_iter().map(|(_, cluster)| cluster).collect()
    }

    fn report_progress(&self, done: usize, total: Option<usize>) {
        match total {
            Some(total) if total > 0 => {
                let percent = (100 * done / total).min(100);
                self.progress.set_percent_completed(percent as i32);
            }
            _ => self.progress.set_percent_completed(-1),
        }
    }
}

/// Detect clusters in `graph` with the given parameters
pub fn find_clusters<'g>(graph: &'g Graph, params: ClusterParams) -> Result<Vec<NodeSet<'g>>> {
    ClusterOne::new(params)?.run(graph)
}

/// Score of every cluster under the quality function of `detector`
pub fn cluster_qualities(detector: &ClusterOne, clusters: &[NodeSet<'_>]) -> Vec<f64> {
    clusters.iter()
        .map(|cluster| detector.quality_function().calculate(cluster))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedMethod;
    use crate::error::Error;
    use crate::seeds::FixedSeedGenerator;

    /// Two 4-cliques joined by the edge 3-4
    fn barbell() -> Graph {
        let mut graph = Graph::new(false);
        for offset in [0, 4] {
            for a in 0..4 {
                for b in (a + 1)..4 {
                    graph.create_unit_edge(offset + a, offset + b);
                }
            }
        }
        graph.create_unit_edge(3, 4);
        graph
    }

    fn clique(graph: &mut Graph, nodes: std::ops::Range<usize>, weight: f64) {
        for a in nodes.clone() {
            for b in (a + 1)..nodes.end {
                graph.create_edge(a, b, weight);
            }
        }
    }

    fn members(clusters: &[NodeSet<'_>]) -> Vec<Vec<usize>> {
        clusters.iter().map(|c| c.members().to_vec()).collect()
    }

    #[test]
    fn finds_both_cliques() {
        let graph = barbell();
        let clusters = find_clusters(&graph, ClusterParams::default()).expect("valid params");

        assert_eq!(members(&clusters), vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
    }

    #[test]
    fn parallel_and_sequential_growth_agree() {
        let graph = barbell();
        let every_node = ClusterParams {
            seed_method: SeedMethod::Nodes,
            ..ClusterParams::default()
        };

        let clusters = find_clusters(&graph, every_node).expect("valid params");
        assert_eq!(members(&clusters), vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
        // Four seeds per clique grow into the same cluster
        assert_eq!(clusters[0].occurrences(), Some(&[4, 4, 4, 4][..]));
    }

    #[test]
    fn min_size_drops_small_clusters() {
        let graph = barbell();
        let params = ClusterParams {
            min_size: 5,
            ..ClusterParams::default()
        };
        assert!(find_clusters(&graph, params).expect("valid params").is_empty());
    }

    #[test]
    fn halted_run_is_empty() {
        let graph = barbell();
        let detector = ClusterOne::new(ClusterParams::default()).expect("valid params");
        detector.halt_flag().request();

        assert!(detector.run(&graph).expect("seeds").is_empty());
    }

    #[test]
    fn invalid_configuration_is_reported() {
        let params = ClusterParams {
            merging_method: MergingMethod::Multi,
            ..ClusterParams::default()
        };
        assert!(matches!(
            ClusterOne::new(params),
            Err(Error::UnsupportedMergingMethod(_))
        ));
    }

    #[test]
    fn qualities_follow_penalty() {
        let graph = barbell();
        let detector = ClusterOne::new(ClusterParams::default()).expect("valid params");
        let clusters = detector.run(&graph).expect("seeds");

        // 6 internal, 1 boundary, 4 members with penalty 2
        for quality in cluster_qualities(&detector, &clusters) {
            assert!((quality - 6.0 / 15.0).abs() < 1e-12);
        }
    }

    #[test]
    fn weighted_density_floor_above_one() {
        let mut graph = Graph::new(false);
        clique(&mut graph, 0..4, 3.0);
        clique(&mut graph, 4..8, 1.5);

        let params = ClusterParams {
            min_density: Some(2.0),
            seed_method: SeedMethod::Nodes,
            ..ClusterParams::default()
        };
        let clusters = find_clusters(&graph, params).expect("valid params");

        assert_eq!(members(&clusters), vec![vec![0, 1, 2, 3]]);
        assert!((clusters[0].density() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn haircut_drops_pendant_after_growth() {
        // Triangle 0-1-2 with the pendant 3 hanging off 2
        let mut graph = Graph::new(false);
        for (a, b) in [(0, 1), (1, 2), (0, 2), (2, 3)] {
            graph.create_unit_edge(a, b);
        }
        let params = ClusterParams {
            node_penalty: 0.0,
            ..ClusterParams::default()
        };

        let plain = find_clusters(&graph, params.clone()).expect("valid params");
        assert_eq!(members(&plain), vec![vec![0, 1, 2, 3]]);

        let trimmed = ClusterParams {
            haircut_threshold: 0.6,
            ..params
        };
        let clusters = find_clusters(&graph, trimmed).expect("valid params");
        assert_eq!(members(&clusters), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn fluff_adds_node_linked_to_most_members() {
        // Node 4 touches three clique members but also ten leaves,
        // so growth alone leaves it outside
        let mut graph = Graph::new(false);
        clique(&mut graph, 0..4, 1.0);
        for member in 0..3 {
            graph.create_unit_edge(4, member);
        }
        for leaf in 5..15 {
            graph.create_unit_edge(4, leaf);
        }

        let grow = |fluff_clusters: bool| {
            let params = ClusterParams {
                fluff_clusters,
                ..ClusterParams::default()
            };
            let detector = ClusterOne::new(params).expect("valid params");
            let seeds = FixedSeedGenerator::new(vec![NodeSet::new(&graph, 0..4)]);
            members(&detector.run_with_seeds(&graph, Box::new(seeds)))
        };

        assert_eq!(grow(false), vec![vec![0, 1, 2, 3]]);
        assert_eq!(grow(true), vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn k_core_filter_needs_dense_enough_clusters() {
        let graph = barbell();
        let with_core = |k_core_threshold: usize| {
            let params = ClusterParams {
                k_core_threshold,
                ..ClusterParams::default()
            };
            members(&find_clusters(&graph, params).expect("valid params"))
        };

        assert_eq!(with_core(3), vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
        assert!(with_core(4).is_empty());
    }
}
