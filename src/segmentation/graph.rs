//! s/t flow network solved with Dinic's algorithm.
//!
//! Arcs are stored in pairs: arc `e` and its reverse `e ^ 1`. Adjacency is a
//! singly linked list per node threaded through `next`.

use std::collections::VecDeque;

/// Residual capacities below this are treated as saturated.
const EPS: f64 = 1e-9;

const NONE: u32 = u32::MAX;

/// Flow network over `node_count` inner nodes plus a source and a sink.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    head: Vec<u32>,
    next: Vec<u32>,
    to: Vec<u32>,
    capacity: Vec<f64>,
    source: u32,
    sink: u32,
    /// Flow already forced through both terminal arcs of a node
    terminal_flow: f64,
}

impl FlowGraph {
    /// Create a graph with `node_count` inner nodes, reserving space for
    /// roughly `edge_hint` undirected edges.
    pub fn new(node_count: usize, edge_hint: usize) -> Self {
        let total = node_count + 2;
        Self {
            head: vec![NONE; total],
            next: Vec::with_capacity(edge_hint * 2),
            to: Vec::with_capacity(edge_hint * 2),
            capacity: Vec::with_capacity(edge_hint * 2),
            source: node_count as u32,
            sink: node_count as u32 + 1,
            terminal_flow: 0.0,
        }
    }

    fn push_arc(&mut self, from: u32, to: u32, capacity: f64) {
        let id = self.to.len() as u32;
        self.to.push(to);
        self.capacity.push(capacity);
        self.next.push(self.head[from as usize]);
        self.head[from as usize] = id;
    }

    /// Connect two inner nodes with capacities in each direction.
    pub fn add_edge(&mut self, a: usize, b: usize, capacity: f64, reverse_capacity: f64) {
        self.push_arc(a as u32, b as u32, capacity);
        self.push_arc(b as u32, a as u32, reverse_capacity);
    }

    /// Connect a node to the source and the sink.
    ///
    /// The smaller of the two weights is pushed through directly, so at most
    /// one terminal arc is added.
    pub fn add_terminal_weights(&mut self, node: usize, from_source: f64, to_sink: f64) {
        let shared = from_source.min(to_sink);
        self.terminal_flow += shared;
        let from_source = from_source - shared;
        let to_sink = to_sink - shared;
        if from_source > EPS {
            self.push_arc(self.source, node as u32, from_source);
            self.push_arc(node as u32, self.source, 0.0);
        }
        if to_sink > EPS {
            self.push_arc(node as u32, self.sink, to_sink);
            self.push_arc(self.sink, node as u32, 0.0);
        }
    }

    /// Compute the maximum flow, leaving the residual graph in place.
    pub fn max_flow(&mut self) -> f64 {
        let node_total = self.head.len();
        let mut level = vec![-1i32; node_total];
        let mut current = vec![NONE; node_total];
        let mut flow = self.terminal_flow;

        while self.build_levels(&mut level) {
            current.copy_from_slice(&self.head);
            flow += self.blocking_flow(&mut level, &mut current);
        }
        flow
    }

    /// Breadth-first levels from the source. Returns whether the sink is reachable.
    fn build_levels(&self, level: &mut [i32]) -> bool {
        level.fill(-1);
        level[self.source as usize] = 0;
        let mut queue = VecDeque::from([self.source]);
        while let Some(u) = queue.pop_front() {
            let mut e = self.head[u as usize];
            while e != NONE {
                let v = self.to[e as usize];
                if self.capacity[e as usize] > EPS && level[v as usize] < 0 {
                    level[v as usize] = level[u as usize] + 1;
                    queue.push_back(v);
                }
                e = self.next[e as usize];
            }
        }
        level[self.sink as usize] >= 0
    }

    /// Saturate every shortest augmenting path, walking the level graph with
    /// an explicit stack and per-node current-arc pointers.
    fn blocking_flow(&mut self, level: &mut [i32], current: &mut [u32]) -> f64 {
        let mut total = 0.0;
        let mut path: Vec<u32> = Vec::new();
        let mut u = self.source;

        loop {
            if u == self.sink {
                let bottleneck = path
                    .iter()
                    .map(|&e| self.capacity[e as usize])
                    .fold(f64::INFINITY, f64::min);
                for &e in &path {
                    self.capacity[e as usize] -= bottleneck;
                    self.capacity[(e ^ 1) as usize] += bottleneck;
                }
                total += bottleneck;
                path.clear();
                u = self.source;
                continue;
            }

            let mut e = current[u as usize];
            while e != NONE {
                let v = self.to[e as usize];
                if self.capacity[e as usize] > EPS && level[v as usize] == level[u as usize] + 1 {
                    break;
                }
                e = self.next[e as usize];
            }
            current[u as usize] = e;

            if e == NONE {
                if u == self.source {
                    return total;
                }
                // Dead end: drop it from the level graph and retreat
                level[u as usize] = -1;
                let Some(back) = path.pop() else {
                    return total;
                };
                u = self.to[(back ^ 1) as usize];
                current[u as usize] = self.next[back as usize];
            } else {
                path.push(e);
                u = self.to[e as usize];
            }
        }
    }

    /// Inner nodes reachable from the source in the residual graph.
    /// Call after [`max_flow`](Self::max_flow).
    pub fn source_side(&self) -> Vec<bool> {
        let mut seen = vec![false; self.head.len()];
        seen[self.source as usize] = true;
        let mut queue = VecDeque::from([self.source]);
        while let Some(u) = queue.pop_front() {
            let mut e = self.head[u as usize];
            while e != NONE {
                let v = self.to[e as usize] as usize;
                if self.capacity[e as usize] > EPS && !seen[v] {
                    seen[v] = true;
                    queue.push_back(v as u32);
                }
                e = self.next[e as usize];
            }
        }
        seen.truncate(self.source as usize);
        seen
    }
}
