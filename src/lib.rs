//! Overlapping cluster detection in weighted graphs
//!
//! Clusters are grown greedily from seeds by maximising a cohesiveness
//! score, then highly overlapping clusters are merged.

pub mod config;
pub mod error;
pub mod progress;
pub mod graph;
pub mod cluster;
pub mod seeds;
pub mod data;
pub mod storage;

pub use cluster::{ClusterOne, NodeSet, NodeSetView, MutableNodeSet};
pub use config::{ClusterParams, MergingMethod, SeedMethod};
pub use error::{Error, Result};
pub use graph::{Direction, Graph, GraphBuilder};
