//! Configuration management for the clustering engine

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use crate::cluster::growth::GrowthOptions;
use crate::cluster::metrics::SimilarityFunction;
use crate::error::{Error, Result};
use crate::graph::Graph;

/// Minimum density used for graphs carrying real edge weights
pub const WEIGHTED_MIN_DENSITY: f64 = 0.3;

/// Minimum density used for graphs where every edge weighs 1.0
pub const UNWEIGHTED_MIN_DENSITY: f64 = 0.5;

/// How overlapping clusters are merged after growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum MergingMethod {
    /// One pass over the overlap graph
    #[default]
    Single,
    /// Repeated passes; recognised but not available
    Multi,
}

impl fmt::Display for MergingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergingMethod::Single => f.write_str("single"),
            MergingMethod::Multi => f.write_str("multi"),
        }
    }
}

impl FromStr for MergingMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(MergingMethod::Single),
            "multi" => Ok(MergingMethod::Multi),
            _ => Err(Error::UnknownMergingMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for MergingMethod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MergingMethod> for String {
    fn from(method: MergingMethod) -> Self {
        method.to_string()
    }
}

/// Where the growth process takes its starting sets from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum SeedMethod {
    /// Every node as a singleton seed
    Nodes,
    /// Both endpoints of every edge
    Edges,
    /// Nodes not yet covered by a cluster
    #[default]
    UnusedNodes,
    /// Maximal cliques
    Cliques,
    /// Seeds listed in a file, one per line
    File(PathBuf),
}

impl fmt::Display for SeedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedMethod::Nodes => f.write_str("nodes"),
            SeedMethod::Edges => f.write_str("edges"),
            SeedMethod::UnusedNodes => f.write_str("unused_nodes"),
            SeedMethod::Cliques => f.write_str("cliques"),
            SeedMethod::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for SeedMethod {
    type Err = Error;

    /// Known keywords select a generator; anything else is a seed file path
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::UnknownSeedMethod(s.to_string()));
        }

        Ok(match trimmed {
            "nodes" => SeedMethod::Nodes,
            "edges" => SeedMethod::Edges,
            "unused_nodes" => SeedMethod::UnusedNodes,
            "cliques" => SeedMethod::Cliques,
            path => SeedMethod::File(PathBuf::from(path)),
        })
    }
}

impl TryFrom<String> for SeedMethod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SeedMethod> for String {
    fn from(method: SeedMethod) -> Self {
        method.to_string()
    }
}

/// Parameters of a clustering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Smallest cluster reported
    pub min_size: usize,

    /// Density floor for growth and for the final filter; `None` picks one
    /// from the graph weights
    pub min_density: Option<f64>,

    /// Similarity at or above which two clusters are merged
    pub overlap_threshold: f64,

    /// Haircut threshold; 0 disables the haircut
    pub haircut_threshold: f64,

    /// Minimum k-core order a cluster must contain; 0 disables the filter
    pub k_core_threshold: usize,

    /// Extra boundary weight charged per member
    pub node_penalty: f64,

    /// Add well-connected boundary nodes after growth
    pub fluff_clusters: bool,

    /// Never remove seed nodes during growth
    pub keep_initial_seeds: bool,

    pub merging_method: MergingMethod,

    pub similarity: SimilarityFunction,

    pub seed_method: SeedMethod,

    /// Pool seed file lines until they induce a connected subgraph
    pub require_connected_seeds: bool,

    /// Whether growth may remove nodes
    pub contraction_allowed: bool,

    /// Move only one node per growth step
    pub only_single_node: bool,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            min_size: 3,
            min_density: None,
            overlap_threshold: 0.8,
            haircut_threshold: 0.0,
            k_core_threshold: 0,
            node_penalty: 2.0,
            fluff_clusters: false,
            keep_initial_seeds: false,
            merging_method: MergingMethod::Single,
            similarity: SimilarityFunction::Match,
            seed_method: SeedMethod::UnusedNodes,
            require_connected_seeds: false,
            contraction_allowed: true,
            only_single_node: false,
        }
    }
}

impl ClusterParams {
    /// Load parameters from a JSON file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> AnyResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open parameter file {}", path.display()))?;
        let params = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse parameter file {}", path.display()))?;
        Ok(params)
    }

    /// Clamp out-of-range values into range and reject unavailable options
    pub fn validate(&mut self) -> Result<()> {
        let defaults = Self::default();

        if self.min_size < 1 {
            log::warn!("min_size {} raised to 1", self.min_size);
            self.min_size = 1;
        }

        if let Some(density) = self.min_density {
            if !density.is_finite() {
                log::warn!("min_density {} is not finite; choosing automatically", density);
                self.min_density = None;
            } else if density < 0.0 {
                // Weighted densities may exceed 1, so there is no upper bound
                log::warn!("min_density {} raised to 0", density);
                self.min_density = Some(0.0);
            }
        }

        self.overlap_threshold =
            clamp_non_negative("overlap_threshold", self.overlap_threshold, defaults.overlap_threshold);
        self.haircut_threshold =
            clamp_non_negative("haircut_threshold", self.haircut_threshold, defaults.haircut_threshold);
        self.node_penalty =
            clamp_non_negative("node_penalty", self.node_penalty, defaults.node_penalty);

        if self.merging_method == MergingMethod::Multi {
            return Err(Error::UnsupportedMergingMethod(self.merging_method.to_string()));
        }

        Ok(())
    }

    /// Minimum density to use for `graph`
    pub fn effective_min_density(&self, graph: &Graph) -> f64 {
        match self.min_density {
            Some(density) => density,
            None if graph.has_uniform_weights() => UNWEIGHTED_MIN_DENSITY,
            None => WEIGHTED_MIN_DENSITY,
        }
    }

    /// Growth switches for `graph`
    pub fn growth_options(&self, graph: &Graph) -> GrowthOptions {
        GrowthOptions {
            min_density: self.effective_min_density(graph),
            keep_initial_seeds: self.keep_initial_seeds,
            contraction_allowed: self.contraction_allowed,
            only_single_node: self.only_single_node,
        }
    }
}

fn clamp_non_negative(name: &str, value: f64, default: f64) -> f64 {
    if !value.is_finite() {
        log::warn!("{} {} is not finite; reset to {}", name, value, default);
        default
    } else if value < 0.0 {
        log::warn!("{} {} raised to 0", name, value);
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse() {
        assert_eq!("single".parse::<MergingMethod>().ok(), Some(MergingMethod::Single));
        assert_eq!("Multi".parse::<MergingMethod>().ok(), Some(MergingMethod::Multi));
        assert!(matches!(
            "pairwise".parse::<MergingMethod>(),
            Err(Error::UnknownMergingMethod(_))
        ));

        assert_eq!("cliques".parse::<SeedMethod>().ok(), Some(SeedMethod::Cliques));
        assert_eq!(
            "seeds/list.txt".parse::<SeedMethod>().ok(),
            Some(SeedMethod::File(PathBuf::from("seeds/list.txt")))
        );
        assert!(matches!("  ".parse::<SeedMethod>(), Err(Error::UnknownSeedMethod(_))));
    }

    #[test]
    fn validation_clamps_values() {
        let mut params = ClusterParams {
            min_size: 0,
            min_density: Some(-0.5),
            overlap_threshold: -0.2,
            node_penalty: f64::NAN,
            ..ClusterParams::default()
        };

        assert!(params.validate().is_ok());
        assert_eq!(params.min_size, 1);
        assert_eq!(params.min_density, Some(0.0));
        assert_eq!(params.overlap_threshold, 0.0);
        assert_eq!(params.node_penalty, 2.0);
    }

    #[test]
    fn min_density_has_no_upper_bound() {
        let mut params = ClusterParams {
            min_density: Some(2.5),
            ..ClusterParams::default()
        };
        assert!(params.validate().is_ok());
        assert_eq!(params.min_density, Some(2.5));

        params.min_density = Some(f64::INFINITY);
        assert!(params.validate().is_ok());
        assert_eq!(params.min_density, None);
    }

    #[test]
    fn multi_merging_is_rejected() {
        let mut params = ClusterParams {
            merging_method: MergingMethod::Multi,
            ..ClusterParams::default()
        };
        assert!(matches!(params.validate(), Err(Error::UnsupportedMergingMethod(_))));
    }

    #[test]
    fn automatic_min_density_follows_weights() {
        let mut graph = Graph::new(false);
        graph.create_unit_edge(0, 1);

        let params = ClusterParams::default();
        assert_eq!(params.effective_min_density(&graph), UNWEIGHTED_MIN_DENSITY);

        graph.create_edge(1, 2, 0.25);
        assert_eq!(params.effective_min_density(&graph), WEIGHTED_MIN_DENSITY);

        let fixed = ClusterParams {
            min_density: Some(0.1),
            ..ClusterParams::default()
        };
        assert_eq!(fixed.effective_min_density(&graph), 0.1);
    }

    #[test]
    fn json_round_trip_keeps_defaults() {
        let json = r#"{ "min_size": 5, "similarity": "jaccard", "seed_method": "edges" }"#;
        let params: ClusterParams = serde_json::from_str(json).expect("valid json");

        assert_eq!(params.min_size, 5);
        assert_eq!(params.similarity, SimilarityFunction::Jaccard);
        assert_eq!(params.seed_method, SeedMethod::Edges);
        assert_eq!(params.overlap_threshold, 0.8);

        let text = serde_json::to_string(&params).expect("serializable");
        assert!(text.contains("\"seed_method\":\"edges\""));
        assert!(text.contains("\"merging_method\":\"single\""));
    }

    #[test]
    fn json_names_ignore_case_like_flags() {
        let json = r#"{ "similarity": "Meet/Min", "merging_method": "SINGLE" }"#;
        let params: ClusterParams = serde_json::from_str(json).expect("valid json");
        assert_eq!(params.similarity, SimilarityFunction::MeetMin);
        assert_eq!(params.merging_method, MergingMethod::Single);

        let unknown = r#"{ "similarity": "cosine" }"#;
        assert!(serde_json::from_str::<ClusterParams>(unknown).is_err());
    }
}
