//! Cluster analysis module

pub mod nodeset;
pub mod mutable;
pub mod quality;
pub mod growth;
pub mod metrics;
pub mod merge;
pub mod detection;

pub use detection::{find_clusters, ClusterOne};
pub use growth::{ClusterGrowthAction, GreedyGrowthProcess, GrowthOptions};
pub use merge::OverlapMerger;
pub use metrics::SimilarityFunction;
pub use mutable::MutableNodeSet;
pub use nodeset::{NodeSet, NodeSetView};
pub use quality::{CohesivenessFunction, QualityFunction};
