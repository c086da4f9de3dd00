use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use cluster_one::cluster::metrics::SimilarityFunction;
use cluster_one::config::{ClusterParams, MergingMethod, SeedMethod};
use cluster_one::progress::LogProgress;
use cluster_one::storage::{self, OutputFormat};
use cluster_one::{data, ClusterOne};

#[derive(Parser, Debug)]
#[clap(
    name = "cluster-one",
    about = "Detect overlapping cohesive clusters in weighted graphs"
)]
struct Cli {
    /// Path to the input edge list (`source target [weight]` per line)
    #[clap(long)]
    input: PathBuf,

    /// Output file for the clusters (standard output if omitted)
    #[clap(long)]
    output: Option<PathBuf>,

    /// Output format
    #[clap(long, value_enum, default_value = "plain")]
    format: OutputFormat,

    /// Treat the input edges as directed
    #[clap(long)]
    directed: bool,

    /// JSON file with clustering parameters; flags below override it
    #[clap(long)]
    config: Option<PathBuf>,

    /// Minimum cluster size
    #[clap(long)]
    min_size: Option<usize>,

    /// Minimum cluster density (chosen from the edge weights if omitted)
    #[clap(long)]
    min_density: Option<f64>,

    /// Overlap threshold for merging
    #[clap(long)]
    overlap_threshold: Option<f64>,

    /// Haircut threshold (0 disables)
    #[clap(long)]
    haircut: Option<f64>,

    /// Minimum k-core order inside each cluster (0 disables)
    #[clap(long)]
    k_core: Option<usize>,

    /// Penalty per node in the cohesiveness score
    #[clap(long)]
    penalty: Option<f64>,

    /// Add boundary nodes linked to most members after growth
    #[clap(long)]
    fluff: bool,

    /// Never remove seed nodes during growth
    #[clap(long)]
    keep_initial_seeds: bool,

    /// Only grow clusters; never remove nodes
    #[clap(long)]
    no_contraction: bool,

    /// Merging method (single or multi)
    #[clap(long)]
    merge_method: Option<MergingMethod>,

    /// Similarity used for merging (match, meet/min, simpson, jaccard, dice)
    #[clap(long)]
    similarity: Option<SimilarityFunction>,

    /// Seed method (nodes, edges, unused_nodes, cliques or a seed file path)
    #[clap(long)]
    seed_method: Option<SeedMethod>,

    /// Pool seed file lines until the pooled nodes are connected
    #[clap(long)]
    connected_seeds: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    /// Parameters from the optional JSON file with flag overrides applied
    fn params(&self) -> Result<ClusterParams> {
        let mut params = match &self.config {
            Some(path) => ClusterParams::from_json_file(path)?,
            None => ClusterParams::default(),
        };

        if let Some(min_size) = self.min_size {
            params.min_size = min_size;
        }
        if self.min_density.is_some() {
            params.min_density = self.min_density;
        }
        if let Some(threshold) = self.overlap_threshold {
            params.overlap_threshold = threshold;
        }
        if let Some(haircut) = self.haircut {
            params.haircut_threshold = haircut;
        }
        if let Some(k) = self.k_core {
            params.k_core_threshold = k;
        }
        if let Some(penalty) = self.penalty {
            params.node_penalty = penalty;
        }
        if let Some(method) = self.merge_method {
            params.merging_method = method;
        }
        if let Some(similarity) = self.similarity {
            params.similarity = similarity;
        }
        if let Some(method) = &self.seed_method {
            params.seed_method = method.clone();
        }
        params.fluff_clusters |= self.fluff;
        params.keep_initial_seeds |= self.keep_initial_seeds;
        params.require_connected_seeds |= self.connected_seeds;
        if self.no_contraction {
            params.contraction_allowed = false;
        }

        Ok(params)
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let params = args.params()?;
    log::info!("Input: {}", args.input.display());
    log::debug!("Parameters: {}", serde_json::to_string(&params)?);

    // 1. Load data
    let graph = data::load_edge_list(&args.input, args.directed)?;

    // 2. Find clusters
    let detector = ClusterOne::new(params)?
        .with_progress(Box::new(LogProgress::new()));
    let clusters = detector.run(&graph)?;

    log::info!("Found {} clusters", clusters.len());

    // 3. Save results
    storage::save_results(
        &clusters,
        &graph,
        detector.quality_function(),
        args.format,
        args.output.as_deref(),
    )?;

    log::info!("Clustering complete");

    Ok(())
}
