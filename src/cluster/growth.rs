//! Greedy local search that grows a cluster one step at a time
//!
//! Every step inspects the external boundary and the members of the current
//! set, picks the single best move (ties are moved together) and applies it.
//! The search stops once no move improves the quality of the set.

use std::collections::HashSet;
use crate::cluster::mutable::MutableNodeSet;
use crate::cluster::nodeset::NodeSetView;
use crate::cluster::quality::QualityFunction;
use crate::graph::traversal;

/// Tolerance a removal must beat the current quality by
const REMOVAL_TOLERANCE: f64 = 1e-12;

/// Single mutation suggested by the growth process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterGrowthAction {
    /// Add all of these nodes
    Add(Vec<usize>),
    /// Remove all of these nodes
    Remove(Vec<usize>),
    /// The set is locally optimal
    Terminate,
}

impl ClusterGrowthAction {
    /// Apply the action to a set; returns false for `Terminate`
    pub fn apply(&self, set: &mut MutableNodeSet<'_>) -> bool {
        match self {
            ClusterGrowthAction::Add(nodes) => {
                for &node in nodes {
                    set.add(node);
                }
                true
            }
            ClusterGrowthAction::Remove(nodes) => {
                for &node in nodes {
                    set.remove(node);
                }
                true
            }
            ClusterGrowthAction::Terminate => false,
        }
    }
}

/// Tunables of the growth process
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthOptions {
    /// Density floor that additions may not break
    pub min_density: f64,

    /// Whether members of the starting set may be removed
    pub keep_initial_seeds: bool,

    /// Whether removal steps are considered at all
    pub contraction_allowed: bool,

    /// Move only one of several tied nodes per step
    pub only_single_node: bool,
}

impl Default for GrowthOptions {
    fn default() -> Self {
        Self {
            min_density: 0.0,
            keep_initial_seeds: false,
            contraction_allowed: true,
            only_single_node: false,
        }
    }
}

/// Greedy growth of a single cluster from its seed
pub struct GreedyGrowthProcess<'s, 'g, Q: ?Sized> {
    set: &'s mut MutableNodeSet<'g>,
    quality: &'s Q,
    options: GrowthOptions,
    protected: HashSet<usize>,
}

impl<'s, 'g, Q: QualityFunction + ?Sized> GreedyGrowthProcess<'s, 'g, Q> {
    /// Start a growth process on `set`; its current members form the seed
    pub fn new(set: &'s mut MutableNodeSet<'g>, quality: &'s Q, options: GrowthOptions) -> Self {
        let protected = if options.keep_initial_seeds {
            set.members().iter().copied().collect()
        } else {
            HashSet::new()
        };

        Self {
            set,
            quality,
            options,
            protected,
        }
    }

    /// The working set
    pub fn set(&self) -> &MutableNodeSet<'g> {
        self.set
    }

    /// Best single move from the current state
    pub fn suggested_action(&self) -> ClusterGrowthAction {
        let set = &*self.set;
        if set.is_empty() {
            return ClusterGrowthAction::Terminate;
        }

        let quality = self.quality.calculate(set);
        let size = set.size();

        // Additions must keep internal weight >= min_density * n(n+1)/2
        let internal_weight_limit = self.options.min_density * (size * (size + 1)) as f64 / 2.0
            - set.total_internal_edge_weight();

        let mut best_nodes: Vec<usize> = Vec::new();
        let mut best_affinity = f64::NEG_INFINITY;
        let mut adding = true;

        for node in set.external_boundary_nodes() {
            if size >= 4 && set.in_weight(node) < internal_weight_limit {
                continue;
            }

            let affinity = self.quality.addition_affinity(set, node);
            if affinity.is_nan() {
                continue;
            }

            if affinity > best_affinity {
                best_affinity = affinity;
                best_nodes.clear();
                best_nodes.push(node);
            } else if affinity == best_affinity {
                best_nodes.push(node);
            }
        }

        if self.options.contraction_allowed && size > 1 {
            let mut cut_vertices: Option<HashSet<usize>> = None;

            for &node in set.members() {
                if self.protected.contains(&node) {
                    continue;
                }

                let affinity = self.quality.removal_affinity(set, node);
                // Strictly better than now, else add/remove cycles appear
                if affinity.is_nan() || affinity < quality + REMOVAL_TOLERANCE {
                    continue;
                }
                if affinity < best_affinity {
                    continue;
                }

                let cut = cut_vertices.get_or_insert_with(|| {
                    traversal::cut_vertices_by(set.graph(), set.members(), |v| set.contains(v))
                });
                if cut.contains(&node) {
                    continue;
                }

                if affinity > best_affinity || adding {
                    best_affinity = affinity;
                    best_nodes.clear();
                    adding = false;
                }
                best_nodes.push(node);
            }
        }

        if best_nodes.is_empty() || best_affinity < quality {
            return ClusterGrowthAction::Terminate;
        }

        if self.options.only_single_node {
            best_nodes.truncate(1);
        }

        if adding {
            ClusterGrowthAction::Add(best_nodes)
        } else {
            ClusterGrowthAction::Remove(best_nodes)
        }
    }

    /// Take one step; returns false once the process has terminated
    pub fn step(&mut self) -> bool {
        let action = self.suggested_action();
        action.apply(self.set)
    }

    /// Run until termination and return the number of steps taken
    pub fn run(&mut self) -> usize {
        let mut steps = 0;
        while self.step() {
            steps += 1;
        }
        log::trace!("Growth converged after {} steps at size {}", steps, self.set.size());
        steps
    }
}
