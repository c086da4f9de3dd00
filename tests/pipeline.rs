use std::io::Cursor;
use cluster_one::cluster::detection::find_clusters;
use cluster_one::data::read_edge_list;
use cluster_one::progress::{HaltFlag, LogProgress};
use cluster_one::seeds::FileSeedGenerator;
use cluster_one::storage::{write_clusters, OutputFormat};
use cluster_one::{ClusterOne, ClusterParams, Graph, NodeSetView, SeedMethod};

const BARBELL: &str = "\
# two complexes joined by a single interaction
a1 a2
a1 a3
a1 a4
a2 a3
a2 a4
a3 a4
a4 b1
b1 b2
b1 b3
b1 b4
b2 b3
b2 b4
b3 b4
";

fn barbell() -> Graph {
    read_edge_list(Cursor::new(BARBELL), false).expect("valid edge list")
}

fn names(graph: &Graph, params: ClusterParams) -> Vec<Vec<String>> {
    find_clusters(graph, params)
        .expect("valid parameters")
        .iter()
        .map(|c| c.member_names())
        .collect()
}

fn expected() -> Vec<Vec<String>> {
    vec![
        vec!["a1".into(), "a2".into(), "a3".into(), "a4".into()],
        vec!["b1".into(), "b2".into(), "b3".into(), "b4".into()],
    ]
}

#[test]
fn every_seed_method_finds_both_complexes() {
    let graph = barbell();
    for method in [SeedMethod::UnusedNodes, SeedMethod::Nodes, SeedMethod::Edges, SeedMethod::Cliques] {
        let params = ClusterParams {
            seed_method: method.clone(),
            ..ClusterParams::default()
        };
        assert_eq!(names(&graph, params), expected(), "seed method {}", method);
    }
}

#[test]
fn low_density_floor_keeps_bridge_union() {
    let graph = barbell();
    let params = ClusterParams {
        min_density: Some(0.4),
        seed_method: SeedMethod::Cliques,
        ..ClusterParams::default()
    };

    // The bridge clique a4-b1 grows into the whole graph (density 13/28)
    let found = names(&graph, params);
    assert_eq!(found.len(), 3);
    assert_eq!(found[0].len(), 8);
    assert_eq!(&found[1..], &expected()[..]);
}

#[test]
fn seed_file_with_fallback() {
    let graph = barbell();
    let detector = ClusterOne::new(ClusterParams::default())
        .expect("valid parameters")
        .with_progress(Box::new(LogProgress::new()));

    let seeds = FileSeedGenerator::from_reader(&graph, Cursor::new("a1 unknown\n*\n"), false)
        .expect("in-memory seeds");
    let clusters = detector.run_with_seeds(&graph, Box::new(seeds));

    let found: Vec<Vec<String>> = clusters.iter().map(|c| c.member_names()).collect();
    assert_eq!(found, expected());
    assert!(clusters.iter().all(|c| c.density() == 1.0));
}

#[test]
fn halted_detector_returns_nothing() {
    let graph = barbell();
    let halt = HaltFlag::new();
    let params = ClusterParams {
        seed_method: SeedMethod::Nodes,
        ..ClusterParams::default()
    };
    let detector = ClusterOne::new(params).expect("valid parameters").with_halt(halt.clone());

    halt.request();
    assert!(detector.run(&graph).expect("seeds").is_empty());
}

#[test]
fn results_serialize_as_json() {
    let graph = barbell();
    let detector = ClusterOne::new(ClusterParams::default()).expect("valid parameters");
    let clusters = detector.run(&graph).expect("seeds");

    let mut buffer = Vec::new();
    write_clusters(&mut buffer, &clusters, &graph, detector.quality_function(), OutputFormat::Json)
        .expect("in-memory write");
    let value: serde_json::Value = serde_json::from_slice(&buffer).expect("valid json");

    assert_eq!(value["cluster_stats"]["cluster_count"], 2);
    assert_eq!(value["clusters"][1]["members"][0], "b1");
    assert_eq!(value["clusters"][0]["density"], 1.0);
}
