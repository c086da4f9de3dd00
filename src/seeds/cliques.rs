//! Maximal cliques as seeds
//!
//! Cliques are enumerated with the Bron–Kerbosch algorithm (with pivoting)
//! on a background thread and handed over through a bounded channel, so
//! enumeration and growth proceed side by side. Dropping the generator
//! stops the worker and waits for it.

use std::thread::JoinHandle;
use crossbeam::channel::{self, Receiver, Sender};
use crate::graph::{Direction, Graph};
use crate::progress::HaltFlag;
use crate::seeds::{Seed, SeedGenerator};

/// Smallest clique emitted by the default seed factory
pub const DEFAULT_MIN_CLIQUE_SIZE: usize = 2;

/// Cliques buffered between the worker and the consumer
const QUEUE_CAPACITY: usize = 256;

pub struct CliqueSeedGenerator<'g> {
    graph: &'g Graph,
    receiver: Option<Receiver<Vec<usize>>>,
    worker: Option<JoinHandle<()>>,
    stop: HaltFlag,
}

impl<'g> CliqueSeedGenerator<'g> {
    /// Start enumerating maximal cliques with at least `min_size` nodes
    pub fn new(graph: &'g Graph, min_size: usize) -> Self {
        Self::with_halt(graph, min_size, HaltFlag::new())
    }

    /// Like [`CliqueSeedGenerator::new`], also stopping when `halt` is raised
    pub fn with_halt(graph: &'g Graph, min_size: usize, halt: HaltFlag) -> Self {
        let adjacency = simple_adjacency(graph);
        let (sender, receiver) = channel::bounded(QUEUE_CAPACITY);

        let stop = HaltFlag::new();
        let worker_stop = stop.clone();
        let worker = std::thread::Builder::new()
            .name("clique-enumeration".to_string())
            .spawn(move || {
                let mut enumerator = CliqueEnumerator {
                    adjacency,
                    min_size,
                    sender,
                    halt,
                    stop: worker_stop,
                    emitted: 0,
                };
                enumerator.run();
                log::debug!("Clique enumeration finished with {} cliques", enumerator.emitted);
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::error!("Failed to start clique enumeration thread: {}", err);
                None
            }
        };

        Self {
            graph,
            receiver: Some(receiver),
            worker,
            stop,
        }
    }

    fn shutdown(&mut self) {
        self.stop.request();
        // Closing the channel unblocks a worker waiting on a full queue
        self.receiver.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Clique enumeration thread panicked");
            }
        }
    }
}

impl<'g> Iterator for CliqueSeedGenerator<'g> {
    type Item = Seed<'g>;

    fn next(&mut self) -> Option<Seed<'g>> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv() {
            Ok(clique) => Some(Seed::new(self.graph, clique)),
            // Every sender is gone: the worker has finished
            Err(_) => {
                self.shutdown();
                None
            }
        }
    }
}

impl<'g> SeedGenerator<'g> for CliqueSeedGenerator<'g> {}

impl Drop for CliqueSeedGenerator<'_> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sorted, deduplicated neighbour lists without self-loops
fn simple_adjacency(graph: &Graph) -> Vec<Vec<usize>> {
    (0..graph.node_count())
        .map(|node| {
            let mut neighbors: Vec<usize> = graph.neighbors(node, Direction::All)
                .filter(|&other| other != node)
                .collect();
            neighbors.sort_unstable();
            neighbors.dedup();
            neighbors
        })
        .collect()
}

/// Intersection of a sorted list with a sorted neighbour list
fn intersect(sorted: &[usize], neighbors: &[usize]) -> Vec<usize> {
    sorted.iter()
        .copied()
        .filter(|node| neighbors.binary_search(node).is_ok())
        .collect()
}

struct CliqueEnumerator {
    adjacency: Vec<Vec<usize>>,
    min_size: usize,
    sender: Sender<Vec<usize>>,
    halt: HaltFlag,
    stop: HaltFlag,
    emitted: usize,
}

impl CliqueEnumerator {
    fn stopped(&self) -> bool {
        self.halt.is_requested() || self.stop.is_requested()
    }

    fn run(&mut self) {
        for node in 0..self.adjacency.len() {
            if self.stopped() {
                return;
            }

            // Every clique is reported from its lowest-index member
            let (later, earlier): (Vec<usize>, Vec<usize>) = self.adjacency[node]
                .iter()
                .partition(|&&other| other > node);

            let mut clique = vec![node];
            if !self.expand(&mut clique, later, earlier) {
                return;
            }
        }
    }

    /// Report every maximal clique extending `clique` with nodes of
    /// `candidates` and none of `excluded`; false once the consumer is gone
    fn expand(
        &mut self,
        clique: &mut Vec<usize>,
        mut candidates: Vec<usize>,
        mut excluded: Vec<usize>,
    ) -> bool {
        if self.stopped() {
            return false;
        }

        if candidates.is_empty() {
            if excluded.is_empty() && clique.len() >= self.min_size {
                let mut found = clique.clone();
                found.sort_unstable();
                if self.sender.send(found).is_err() {
                    return false;
                }
                self.emitted += 1;
            }
            return true;
        }

        // Pivot on the node covering most candidates
        let pivot = candidates.iter()
            .chain(&excluded)
            .copied()
            .max_by_key(|&p| intersect(&candidates, &self.adjacency[p]).len())
            .unwrap_or(candidates[0]);

        let branches: Vec<usize> = candidates.iter()
            .copied()
            .filter(|node| self.adjacency[pivot].binary_search(node).is_err())
            .collect();

        for node in branches {
            let next_candidates = intersect(&candidates, &self.adjacency[node]);
            let next_excluded = intersect(&excluded, &self.adjacency[node]);

            clique.push(node);
            let keep_going = self.expand(clique, next_candidates, next_excluded);
            clique.pop();
            if !keep_going {
                return false;
            }

            candidates.retain(|&c| c != node);
            let pos = excluded.binary_search(&node).unwrap_or_else(|p| p);
            excluded.insert(pos, node);
        }

        true
    }
}
