//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! The engine calls routing via the [`Router`] trait, so alternative search
//! strategies (A*, contraction hierarchies) can be swapped in without touching
//! the query façade.  The default [`DijkstraRouter`] is sufficient for a
//! city-scale graph.
//!
//! # Cost units
//!
//! Costs are segment `length` in metres (`f64`).  Non-negative lengths are
//! guaranteed by [`GraphStore::upsert_segment`], so plain Dijkstra is correct.
//!
//! # No route vs. error
//!
//! A disconnected pair yields an empty [`Path`], not an error.  Errors are
//! reserved for unknown nodes and deadline expiry.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use tracing::debug;

use sg_core::{EdgeId, NodeId};

use crate::network::{Direction, GraphStore};
use crate::{NetworkError, NetworkResult};

/// Heap pops between two deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 256;

// ── Path ──────────────────────────────────────────────────────────────────────

/// The result of a routing query.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Intersections from source to destination.  Empty when no path exists;
    /// a single node when source and destination coincide.
    pub nodes: Vec<NodeId>,
    /// Segments traversed in order; `nodes.len() - 1` entries for a found path.
    pub edges: Vec<EdgeId>,
    /// Sum of segment lengths in metres.
    pub length: f64,
}

impl Path {
    /// The "no route" result.
    pub fn empty() -> Self {
        Self { nodes: Vec::new(), edges: Vec::new(), length: 0.0 }
    }

    /// `true` if no path was found.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable single-pair routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so one router can serve concurrent
/// queries against shared snapshots.
pub trait Router: Send + Sync {
    /// Compute the lowest-length path from `from` to `to`.
    ///
    /// `deadline`, if given, bounds the search; on expiry the call returns
    /// [`NetworkError::Timeout`] and no partial path.
    fn route(
        &self,
        graph: &GraphStore,
        from: NodeId,
        to: NodeId,
        deadline: Option<Instant>,
    ) -> NetworkResult<Path>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra's algorithm over the road graph, honouring `oneway`.
///
/// Determinism: heap ties break on `NodeId`, adjacency is scanned in
/// insertion order and a predecessor is only replaced by a strictly shorter
/// candidate, so an unchanged graph always yields the same path.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        graph: &GraphStore,
        from: NodeId,
        to: NodeId,
        deadline: Option<Instant>,
    ) -> NetworkResult<Path> {
        dijkstra(graph, from, to, deadline)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

#[derive(Copy, Clone)]
struct State {
    cost: f64,
    node: NodeId,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

// Min-heap by cost, then by NodeId (reversed from standard Rust BinaryHeap).
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn dijkstra(
    graph: &GraphStore,
    from: NodeId,
    to: NodeId,
    deadline: Option<Instant>,
) -> NetworkResult<Path> {
    let n = graph.node_count();
    if from.index() >= n {
        return Err(NetworkError::NodeNotFound(from));
    }
    if to.index() >= n {
        return Err(NetworkError::NodeNotFound(to));
    }
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Err(NetworkError::Timeout { settled: 0 });
    }
    if from == to {
        return Ok(Path { nodes: vec![from], edges: vec![], length: 0.0 });
    }

    // dist[v] = best known length to reach v.
    let mut dist = vec![f64::INFINITY; n];
    // prev[v] = (segment, predecessor) that reached v.
    let mut prev: Vec<Option<(EdgeId, NodeId)>> = vec![None; n];

    dist[from.index()] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(State { cost: 0.0, node: from });
    let mut pops = 0usize;

    while let Some(State { cost, node }) = heap.pop() {
        pops += 1;
        if pops % DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(NetworkError::Timeout { settled: pops });
                }
            }
        }

        if node == to {
            return Ok(reconstruct(&prev, from, to, cost));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for step in graph.neighbors(node, Direction::Traversable)? {
            let Some(segment) = graph.segment(step.edge) else {
                continue;
            };
            let new_cost = cost + segment.length;
            if new_cost < dist[step.node.index()] {
                dist[step.node.index()] = new_cost;
                prev[step.node.index()] = Some((step.edge, node));
                heap.push(State { cost: new_cost, node: step.node });
            }
        }
    }

    debug!(%from, %to, settled = pops, "no route between intersections");
    Ok(Path::empty())
}

fn reconstruct(
    prev: &[Option<(EdgeId, NodeId)>],
    from: NodeId,
    to: NodeId,
    length: f64,
) -> Path {
    let mut nodes = vec![to];
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let Some((edge, before)) = prev[cur.index()] else {
            break;
        };
        edges.push(edge);
        nodes.push(before);
        cur = before;
    }
    nodes.reverse();
    edges.reverse();
    Path { nodes, edges, length }
}
