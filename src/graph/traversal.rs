//! Breadth-first and depth-first traversal, optionally restricted to a subset
//! of nodes, plus the connectivity queries built on top of them.
//!
//! Edge directions are ignored everywhere in this module: a restricted
//! traversal walks the weakly connected part of the induced subgraph. Nodes
//! rejected by the restriction behave as if they had already been visited.

use std::collections::{HashMap, HashSet, VecDeque};
use crate::graph::{Direction, Graph};

fn allow_all(_: usize) -> bool {
    true
}

/// Breadth-first iterator over the nodes reachable from a start node
pub struct BreadthFirst<'g, F> {
    graph: &'g Graph,
    queue: VecDeque<usize>,
    visited: HashSet<usize>,
    allowed: F,
}

impl<'g> BreadthFirst<'g, fn(usize) -> bool> {
    /// Unrestricted traversal of the whole graph
    pub fn new(graph: &'g Graph, start: usize) -> Self {
        BreadthFirst::restricted(graph, start, allow_all as fn(usize) -> bool)
    }
}

impl<'g, F: Fn(usize) -> bool> BreadthFirst<'g, F> {
    /// Traversal that never leaves the nodes accepted by `allowed`
    pub fn restricted(graph: &'g Graph, start: usize, allowed: F) -> Self {
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        if allowed(start) {
            queue.push_back(start);
            visited.insert(start);
        }
        Self { graph, queue, visited, allowed }
    }
}

impl<F: Fn(usize) -> bool> Iterator for BreadthFirst<'_, F> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let node = self.queue.pop_front()?;
        for neighbor in self.graph.neighbors(node, Direction::All) {
            if (self.allowed)(neighbor) && self.visited.insert(neighbor) {
                self.queue.push_back(neighbor);
            }
        }
        Some(node)
    }
}

/// Depth-first (preorder) iterator over the nodes reachable from a start node
pub struct DepthFirst<'g, F> {
    graph: &'g Graph,
    stack: Vec<usize>,
    visited: HashSet<usize>,
    allowed: F,
}

impl<'g> DepthFirst<'g, fn(usize) -> bool> {
    /// Unrestricted traversal of the whole graph
    pub fn new(graph: &'g Graph, start: usize) -> Self {
        DepthFirst::restricted(graph, start, allow_all as fn(usize) -> bool)
    }
}

impl<'g, F: Fn(usize) -> bool> DepthFirst<'g, F> {
    /// Traversal that never leaves the nodes accepted by `allowed`
    pub fn restricted(graph: &'g Graph, start: usize, allowed: F) -> Self {
        let stack = if allowed(start) { vec![start] } else { Vec::new() };
        Self {
            graph,
            stack,
            visited: HashSet::new(),
            allowed,
        }
    }
}

impl<F: Fn(usize) -> bool> Iterator for DepthFirst<'_, F> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some(node) = self.stack.pop() {
            if !self.visited.insert(node) {
                continue;
            }

            let start = self.stack.len();
            for neighbor in self.graph.neighbors(node, Direction::All) {
                if (self.allowed)(neighbor) && !self.visited.contains(&neighbor) {
                    self.stack.push(neighbor);
                }
            }
            // Visit neighbours in adjacency order
            self.stack[start..].reverse();

            return Some(node);
        }
        None
    }
}

/// Whether the subgraph induced by `members` is connected.
///
/// `contains` must agree with `members`. Empty and singleton sets are
/// connected.
pub fn is_connected_by<F>(graph: &Graph, members: &[usize], contains: F) -> bool
where
    F: Fn(usize) -> bool,
{
    match members.first() {
        None => true,
        Some(&start) => BreadthFirst::restricted(graph, start, contains).count() == members.len(),
    }
}

/// Whether removing `node` disconnects the subgraph induced by `members`
pub fn is_cut_vertex_by<F>(graph: &Graph, members: &[usize], node: usize, contains: F) -> bool
where
    F: Fn(usize) -> bool,
{
    if !contains(node) || members.len() < 3 {
        return false;
    }

    let Some(&start) = members.iter().find(|&&m| m != node) else {
        return false;
    };

    let visited = BreadthFirst::restricted(graph, start, |v| v != node && contains(v)).count();
    visited < members.len() - 1
}

/// Frame of the iterative low-point search
struct Frame {
    node: usize,
    parent_edge: Option<usize>,
    edges: Vec<usize>,
    next: usize,
    children: usize,
}

impl Frame {
    fn new(graph: &Graph, node: usize, parent_edge: Option<usize>) -> Self {
        Self {
            node,
            parent_edge,
            edges: graph.adjacent_edges(node, Direction::All).collect(),
            next: 0,
            children: 0,
        }
    }
}

/// All articulation points of the subgraph induced by `members`, computed in
/// a single depth-first pass using Tarjan's low-point method.
pub fn cut_vertices_by<F>(graph: &Graph, members: &[usize], contains: F) -> HashSet<usize>
where
    F: Fn(usize) -> bool,
{
    let mut discovery: HashMap<usize, usize> = HashMap::with_capacity(members.len());
    let mut low: HashMap<usize, usize> = HashMap::with_capacity(members.len());
    let mut cut = HashSet::new();
    let mut timer = 0;

    for &root in members {
        if discovery.contains_key(&root) {
            continue;
        }

        discovery.insert(root, timer);
        low.insert(root, timer);
        timer += 1;

        let mut stack = vec![Frame::new(graph, root, None)];

        while let Some(top) = stack.len().checked_sub(1) {
            let node = stack[top].node;

            if stack[top].next < stack[top].edges.len() {
                let edge = stack[top].edges[stack[top].next];
                stack[top].next += 1;

                if Some(edge) == stack[top].parent_edge || graph.is_loop(edge) {
                    continue;
                }

                let other = graph.edge_endpoint(edge, node);
                if !contains(other) {
                    continue;
                }

                match discovery.get(&other) {
                    Some(&seen) => {
                        if seen < low[&node] {
                            low.insert(node, seen);
                        }
                    }
                    None => {
                        discovery.insert(other, timer);
                        low.insert(other, timer);
                        timer += 1;
                        stack[top].children += 1;
                        stack.push(Frame::new(graph, other, Some(edge)));
                    }
                }
                continue;
            }

            let Some(finished) = stack.pop() else { break };
            match stack.last() {
                Some(parent) => {
                    let child_low = low[&finished.node];
                    if child_low < low[&parent.node] {
                        low.insert(parent.node, child_low);
                    }
                    // The root is judged by its child count instead
                    if stack.len() > 1 && child_low >= discovery[&parent.node] {
                        cut.insert(parent.node);
                    }
                }
                None => {
                    if finished.children > 1 {
                        cut.insert(finished.node);
                    }
                }
            }
        }
    }

    cut
}

/// Whether the subgraph induced by `members` is connected
pub fn is_connected(graph: &Graph, members: &[usize]) -> bool {
    let set: HashSet<usize> = members.iter().copied().collect();
    is_connected_by(graph, members, |v| set.contains(&v))
}

/// Whether removing `node` disconnects the subgraph induced by `members`
pub fn is_cut_vertex(graph: &Graph, members: &[usize], node: usize) -> bool {
    let set: HashSet<usize> = members.iter().copied().collect();
    is_cut_vertex_by(graph, members, node, |v| set.contains(&v))
}

/// Articulation points of the subgraph induced by `members`
pub fn cut_vertices(graph: &Graph, members: &[usize]) -> HashSet<usize> {
    let set: HashSet<usize> = members.iter().copied().collect();
    cut_vertices_by(graph, members, |v| set.contains(&v))
}

/// Weakly connected components of the whole graph, each sorted by node index
pub fn connected_components(graph: &Graph) -> Vec<Vec<usize>> {
    let mut assigned = vec![false; graph.node_count()];
    let mut components = Vec::new();

    for start in 0..graph.node_count() {
        if assigned[start] {
            continue;
        }

        let mut component: Vec<usize> = BreadthFirst::new(graph, start).collect();
        for &node in &component {
            assigned[node] = true;
        }
        component.sort_unstable();
        components.push(component);
    }

    components
}
