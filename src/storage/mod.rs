//! Results persistence module

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use anyhow::Result;
use clap::ValueEnum;
use serde_json::{json, to_string_pretty};
use crate::cluster::nodeset::{NodeSet, NodeSetView};
use crate::cluster::quality::QualityFunction;
use crate::graph::Graph;

/// Cluster list formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One cluster per line, member names separated by tabs
    #[default]
    Plain,
    /// One row of statistics per cluster
    Csv,
    /// Graph summary plus every cluster
    Json,
}

/// Save clusters to `path`, or to standard output when `path` is `None`
pub fn save_results(
    clusters: &[NodeSet<'_>],
    graph: &Graph,
    quality: &dyn QualityFunction,
    format: OutputFormat,
    path: Option<&Path>,
) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            log::info!("Saving {} clusters to {}", clusters.len(), path.display());
            let mut out = BufWriter::new(File::create(path)?);
            write_clusters(&mut out, clusters, graph, quality, format)?;
            out.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            write_clusters(&mut out, clusters, graph, quality, format)?;
            out.flush()?;
        }
    }
    Ok(())
}

/// Write clusters in the requested format
pub fn write_clusters<W: Write>(
    out: &mut W,
    clusters: &[NodeSet<'_>],
    graph: &Graph,
    quality: &dyn QualityFunction,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Plain => write_plain(out, clusters),
        OutputFormat::Csv => write_csv(out, clusters, quality),
        OutputFormat::Json => write_json(out, clusters, graph, quality),
    }
}

/// One line per cluster with tab separated member names
pub fn write_plain<W: Write>(out: &mut W, clusters: &[NodeSet<'_>]) -> Result<()> {
    for cluster in clusters {
        writeln!(out, "{}", cluster.member_names().join("\t"))?;
    }
    Ok(())
}

/// Per-cluster statistics with a header row
pub fn write_csv<W: Write>(
    out: &mut W,
    clusters: &[NodeSet<'_>],
    quality: &dyn QualityFunction,
) -> Result<()> {
    writeln!(
        out,
        "Cluster,Size,Density,Internal weight,External weight,Quality,P-value,Members"
    )?;

    for (idx, cluster) in clusters.iter().enumerate() {
        writeln!(
            out,
            "{},{},{:.3},{:.3},{:.3},{:.3},{:.3e},\"{}\"",
            idx + 1,
            cluster.size(),
            cluster.density(),
            cluster.total_internal_edge_weight(),
            cluster.total_boundary_edge_weight(),
            cluster.quality(quality),
            cluster.significance(),
            cluster.member_names().join(" ").replace('"', "\"\"")
        )?;
    }
    Ok(())
}

/// Graph summary and cluster details as pretty printed JSON
pub fn write_json<W: Write>(
    out: &mut W,
    clusters: &[NodeSet<'_>],
    graph: &Graph,
    quality: &dyn QualityFunction,
) -> Result<()> {
    let clustered: usize = clusters.iter().map(|c| c.size()).sum();

    let document = json!({
        "graph_stats": {
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
            "directed": graph.is_directed(),
        },
        "cluster_stats": {
            "cluster_count": clusters.len(),
            "total_clustered_nodes": clustered,
            "largest_cluster_size": clusters.iter().map(|c| c.size()).max().unwrap_or(0),
            "avg_cluster_size": clustered as f64 /
                                if clusters.is_empty() { 1.0 } else { clusters.len() as f64 },
        },
        "clusters": clusters.iter().enumerate().map(|(idx, c)| {
            json!({
                "id": idx + 1,
                "size": c.size(),
                "density": c.density(),
                "internal_weight": c.total_internal_edge_weight(),
                "boundary_weight": c.total_boundary_edge_weight(),
                "quality": c.quality(quality),
                "p_value": c.significance(),
                "members": c.member_names(),
                "occurrences": c.occurrences(),
            })
        }).collect::<Vec<_>>()
    });

    writeln!(out, "{}", to_string_pretty(&document)?)?;
    Ok(())
}
