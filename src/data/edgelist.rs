//! Whitespace separated edge lists
//!
//! Every non-empty line holds `source target [weight]`. Lines starting with
//! `#` are comments. A missing weight means 1.0.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use anyhow::{Context, Result};
use crate::error::Error;
use crate::graph::{Graph, GraphBuilder};

/// Load an edge list file into a graph
pub fn load_edge_list<P: AsRef<Path>>(path: P, directed: bool) -> Result<Graph> {
    let path = path.as_ref();
    log::info!("Reading edge list: {}", path.display());

    if !path.exists() {
        return Err(anyhow::anyhow!("File not found: {}", path.display()));
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let graph = read_edge_list(BufReader::new(file), directed)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    log::info!(
        "Loaded graph with {} nodes and {} edges ({} KiB)",
        graph.node_count(),
        graph.edge_count(),
        graph.memory_usage() / 1024
    );
    Ok(graph)
}

/// Read an edge list from any buffered reader
pub fn read_edge_list<R: BufRead>(reader: R, directed: bool) -> Result<Graph> {
    let mut builder = GraphBuilder::new(directed);

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(src), Some(dst)) = (fields.next(), fields.next()) else {
            return Err(parse_error(idx, "expected at least two node names"));
        };

        let weight = match fields.next() {
            None => 1.0,
            Some(text) => text
                .parse::<f64>()
                .map_err(|err| parse_error(idx, &format!("invalid weight '{}': {}", text, err)))?,
        };
        if !weight.is_finite() || weight < 0.0 {
            return Err(parse_error(idx, &format!("weight {} is not a non-negative number", weight)));
        }

        builder.add_edge(src, dst, weight);
    }

    Ok(builder.build())
}

fn parse_error(idx: usize, message: &str) -> anyhow::Error {
    Error::Parse {
        line: idx + 1,
        message: message.to_string(),
    }
    .into()
}
