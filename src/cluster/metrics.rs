//! Cluster statistics, set similarities and post-processing passes

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use statrs::distribution::{ContinuousCDF, Normal};
use crate::cluster::mutable::MutableNodeSet;
use crate::cluster::nodeset::{NodeSet, NodeSetView};
use crate::error::Error;
use crate::graph::{Direction, Graph};

/// Pairwise similarity measures between node sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SimilarityFunction {
    /// Matching coefficient: |A∩B|² / (|A|·|B|)
    Match,

    /// Meet/min (Simpson) coefficient: |A∩B| / min(|A|, |B|)
    MeetMin,

    /// Jaccard index: |A∩B| / |A∪B|
    Jaccard,

    /// Dice coefficient: 2·|A∩B| / (|A| + |B|)
    Dice,
}

impl SimilarityFunction {
    /// Similarity from the intersection size and the two set sizes
    pub fn from_counts(self, shared: usize, a: usize, b: usize) -> f64 {
        if a == 0 || b == 0 {
            return 0.0;
        }

        let shared = shared as f64;
        let (a, b) = (a as f64, b as f64);
        match self {
            SimilarityFunction::Match => shared * shared / (a * b),
            SimilarityFunction::MeetMin => shared / a.min(b),
            SimilarityFunction::Jaccard => shared / (a + b - shared),
            SimilarityFunction::Dice => 2.0 * shared / (a + b),
        }
    }

    /// Similarity of two node sets
    pub fn similarity(self, a: &NodeSet<'_>, b: &NodeSet<'_>) -> f64 {
        self.from_counts(a.intersection_size(b), a.size(), b.size())
    }

    pub fn name(self) -> &'static str {
        match self {
            SimilarityFunction::Match => "match",
            SimilarityFunction::MeetMin => "meet/min",
            SimilarityFunction::Jaccard => "jaccard",
            SimilarityFunction::Dice => "dice",
        }
    }
}

impl Default for SimilarityFunction {
    fn default() -> Self {
        SimilarityFunction::Match
    }
}

impl fmt::Display for SimilarityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimilarityFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "match" => Ok(SimilarityFunction::Match),
            "meet/min" | "simpson" => Ok(SimilarityFunction::MeetMin),
            "jaccard" => Ok(SimilarityFunction::Jaccard),
            "dice" => Ok(SimilarityFunction::Dice),
            _ => Err(Error::UnknownSimilarity(s.to_string())),
        }
    }
}

impl TryFrom<String> for SimilarityFunction {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SimilarityFunction> for String {
    fn from(function: SimilarityFunction) -> Self {
        function.name().to_string()
    }
}

/// Average ranks of `values` (1-based), ties sharing the mean rank.
/// Also returns the tie correction term `sum(t^3 - t)`.
fn average_ranks(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut ties = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }

        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }

        let t = (end - start) as f64;
        ties += t * t * t - t;
        start = end;
    }

    (ranks, ties)
}

/// One-sided Mann-Whitney U test p-value for `xs` being stochastically
/// larger than `ys`, using the normal approximation with tie correction.
///
/// Returns 1.0 when either sample is empty or all values are tied.
pub fn mann_whitney_p_value(xs: &[f64], ys: &[f64]) -> f64 {
    let (n1, n2) = (xs.len(), ys.len());
    if n1 == 0 || n2 == 0 {
        return 1.0;
    }

    let pooled: Vec<f64> = xs.iter().chain(ys).copied().collect();
    let (ranks, ties) = average_ranks(&pooled);

    let rank_sum: f64 = ranks[..n1].iter().sum();
    let (n1, n2) = (n1 as f64, n2 as f64);
    let n = n1 + n2;

    let u = rank_sum - n1 * (n1 + 1.0) / 2.0;
    let mean = n1 * n2 / 2.0;
    let variance = n1 * n2 / 12.0 * ((n + 1.0) - ties / (n * (n - 1.0)));
    if variance.is_nan() || variance <= 0.0 {
        return 1.0;
    }

    let z = (u - mean) / variance.sqrt();
    match Normal::new(0.0, 1.0) {
        Ok(normal) => 1.0 - normal.cdf(z),
        Err(_) => 1.0,
    }
}

/// Members of the `k`-core of the subgraph induced by `members`
pub fn k_core(graph: &Graph, members: &[usize], k: usize) -> Vec<usize> {
    let mut alive: HashSet<usize> = members.iter().copied().collect();
    let mut degree: HashMap<usize, usize> = HashMap::with_capacity(members.len());

    for &node in members {
        let d = graph.adjacent_edges(node, Direction::All)
            .filter(|&edge| !graph.is_loop(edge))
            .filter(|&edge| alive.contains(&graph.edge_endpoint(edge, node)))
            .count();
        degree.insert(node, d);
    }

    let mut queue: Vec<usize> = members.iter()
        .copied()
        .filter(|node| degree[node] < k)
        .collect();

    while let Some(node) = queue.pop() {
        if !alive.remove(&node) {
            continue;
        }
        for edge in graph.adjacent_edges(node, Direction::All) {
            if graph.is_loop(edge) {
                continue;
            }
            let other = graph.edge_endpoint(edge, node);
            if !alive.contains(&other) {
                continue;
            }
            if let Some(d) = degree.get_mut(&other) {
                *d -= 1;
                if *d + 1 == k {
                    queue.push(other);
                }
            }
        }
    }

    let mut core: Vec<usize> = alive.into_iter().collect();
    core.sort_unstable();
    core
}

/// Whether the set contains a non-empty `k`-core
pub fn has_k_core(set: &NodeSet<'_>, k: usize) -> bool {
    !k_core(set.graph(), set.members(), k).is_empty()
}

/// Repeatedly drop the member with the lowest internal weight while that
/// weight is below `threshold` times the average internal weight per member.
/// Returns the number of removed members.
pub fn haircut(set: &mut MutableNodeSet<'_>, threshold: f64) -> usize {
    if threshold <= 0.0 {
        return 0;
    }

    let mut removed = 0;
    while !set.is_empty() {
        let limit = 2.0 * set.total_internal_edge_weight() / set.size() as f64 * threshold;

        let weakest = set.members()
            .iter()
            .copied()
            .min_by(|&a, &b| set.in_weight(a).total_cmp(&set.in_weight(b)));

        match weakest {
            Some(node) if set.in_weight(node) < limit => {
                set.remove(node);
                removed += 1;
            }
            _ => break,
        }
    }

    removed
}

/// Add every boundary node adjacent to more than two thirds of the members.
/// Candidates are judged against the set as it was before fluffing.
pub fn fluff(set: &mut MutableNodeSet<'_>) -> usize {
    let graph = set.graph_ref();
    let limit = 2.0 * set.size() as f64 / 3.0;

    let candidates: Vec<usize> = set.external_boundary_nodes()
        .into_iter()
        .filter(|&node| {
            let linked: HashSet<usize> = graph.neighbors(node, Direction::All)
                .filter(|&other| set.contains(other))
                .collect();
            linked.len() as f64 > limit
        })
        .collect();

    for &node in &candidates {
        set.add(node);
    }
    candidates.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use test_case::test_case;

    #[test_case(SimilarityFunction::Match, 4.0 / 12.0; "match")]
    #[test_case(SimilarityFunction::MeetMin, 2.0 / 3.0; "meet_min")]
    #[test_case(SimilarityFunction::Jaccard, 2.0 / 5.0; "jaccard")]
    #[test_case(SimilarityFunction::Dice, 4.0 / 7.0; "dice")]
    fn similarity_values(function: SimilarityFunction, expected: f64) {
        // |A| = 3, |B| = 4, two shared members
        assert!(approx_eq!(f64, function.from_counts(2, 3, 4), expected));
    }

    #[test]
    fn similarity_names() {
        assert_eq!("simpson".parse::<SimilarityFunction>().ok(), Some(SimilarityFunction::MeetMin));
        assert_eq!("Meet/Min".parse::<SimilarityFunction>().ok(), Some(SimilarityFunction::MeetMin));
        assert_eq!("dice".parse::<SimilarityFunction>().ok(), Some(SimilarityFunction::Dice));
        assert!(matches!(
            "cosine".parse::<SimilarityFunction>(),
            Err(Error::UnknownSimilarity(name)) if name == "cosine"
        ));
        assert_eq!(SimilarityFunction::Jaccard.to_string(), "jaccard");
    }

    #[test]
    fn serde_uses_the_same_names() {
        let parsed: Vec<SimilarityFunction> = serde_json::from_str(r#"["Simpson", "JACCARD", "meet/min"]"#)
            .expect("known names");
        assert_eq!(
            parsed,
            vec![SimilarityFunction::MeetMin, SimilarityFunction::Jaccard, SimilarityFunction::MeetMin]
        );
        assert_eq!(
            serde_json::to_string(&SimilarityFunction::MeetMin).expect("serializable"),
            "\"meet/min\""
        );
        assert!(serde_json::from_str::<SimilarityFunction>("\"cosine\"").is_err());
    }

    #[test]
    fn empty_sets_are_dissimilar() {
        assert_eq!(SimilarityFunction::Match.from_counts(0, 0, 5), 0.0);
        assert_eq!(SimilarityFunction::MeetMin.from_counts(0, 3, 0), 0.0);
    }

    #[test]
    fn mann_whitney_direction() {
        let high = [5.0, 6.0, 7.0, 8.0, 9.0];
        let low = [0.0, 1.0, 0.5, 1.5, 0.0];

        let p = mann_whitney_p_value(&high, &low);
        assert!(p < 0.01, "p = {}", p);

        let q = mann_whitney_p_value(&low, &high);
        assert!(q > 0.99, "q = {}", q);

        assert_eq!(mann_whitney_p_value(&[1.0, 1.0], &[1.0]), 1.0);
        assert_eq!(mann_whitney_p_value(&[], &[1.0]), 1.0);
    }

    #[test]
    fn ranks_share_ties() {
        let (ranks, ties) = average_ranks(&[3.0, 1.0, 3.0, 2.0]);
        assert_eq!(ranks, vec![3.5, 1.0, 3.5, 2.0]);
        assert_eq!(ties, 6.0);
    }

    fn k4_with_tail() -> Graph {
        let mut graph = Graph::new(false);
        for a in 0..4 {
            for b in (a + 1)..4 {
                graph.create_unit_edge(a, b);
            }
        }
        graph.create_unit_edge(3, 4);
        graph.create_unit_edge(4, 5);
        graph
    }

    #[test]
    fn k_core_peels_tail() {
        let graph = k4_with_tail();
        let members: Vec<usize> = (0..6).collect();

        assert_eq!(k_core(&graph, &members, 3), vec![0, 1, 2, 3]);
        assert_eq!(k_core(&graph, &members, 1), members);
        assert!(k_core(&graph, &members, 4).is_empty());

        let set = NodeSet::new(&graph, members);
        assert!(has_k_core(&set, 2));
        assert!(!has_k_core(&set, 4));
    }

    #[test]
    fn haircut_trims_tail() {
        let graph = k4_with_tail();
        let mut set = MutableNodeSet::from_members(&graph, 0..6);

        assert_eq!(haircut(&mut set, 0.0), 0);
        assert_eq!(haircut(&mut set, 0.5), 2);

        let mut members = set.members().to_vec();
        members.sort_unstable();
        assert_eq!(members, vec![0, 1, 2, 3]);
    }

    #[test]
    fn fluff_adds_well_linked_neighbours() {
        let graph = k4_with_tail();
        let mut set = MutableNodeSet::from_members(&graph, [0, 1, 2]);

        assert_eq!(fluff(&mut set), 1);
        assert!(set.contains(3));

        let mut sparse = MutableNodeSet::from_members(&graph, [2, 3, 4]);
        assert_eq!(fluff(&mut sparse), 0);
    }
}
