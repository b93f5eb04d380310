// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crossbeam::queue::SegQueue;
use parking_lot::{Condvar, Mutex};
use std::{
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
    time::Duration,
};

/// Dense identifier of a vertex, assigned in `[0, n)` by `init(n)`.
pub type VertexId = u32;

/// Sentinel returned by `pop` when no vertex is available.
pub const INVALID_ID: VertexId = VertexId::MAX;

/// Upper bound on how long a blocking `pop` parks between probes, so a
/// missed wakeup degrades to a short poll instead of a deadlock.
const POP_PARK_INTERVAL: Duration = Duration::from_millis(10);

struct Vertex {
    /// Number of unconsumed predecessors. Decremented concurrently by
    /// `consume`; the vertex becomes ready when it reaches zero.
    in_degree: AtomicU32,

    /// Dependent vertices, immutable once the graph is sealed.
    out_edges: Vec<VertexId>,
}

/// A conflict graph over one batch of transactions.
///
/// Construction (`init`, `add_edge`, `seal`, `clear`) is single-threaded and
/// takes `&mut self`; draining (`pop`, `consume`, `stop`) takes `&self` and
/// is safe from any number of worker threads. Every vertex enters the ready
/// queue exactly once, and only after all of its predecessors have been
/// consumed.
pub struct ConflictGraph {
    vertices: Vec<Vertex>,
    ready: SegQueue<VertexId>,
    consumed: AtomicU32,
    total: u32,
    stopped: AtomicBool,
    wake_lock: Mutex<()>,
    wake: Condvar,
}

impl Default for ConflictGraph {
    fn default() -> Self { ConflictGraph::new() }
}

impl ConflictGraph {
    pub fn new() -> Self {
        ConflictGraph {
            vertices: Vec::new(),
            ready: SegQueue::new(),
            consumed: AtomicU32::new(0),
            total: 0,
            stopped: AtomicBool::new(false),
            wake_lock: Mutex::new(()),
            wake: Condvar::new(),
        }
    }

    /// Resets the graph and allocates `n` vertices with no edges. Must be
    /// called before any other operation.
    pub fn init(&mut self, n: u32) {
        self.vertices.clear();
        self.vertices.reserve(n as usize);
        for _ in 0..n {
            self.vertices.push(Vertex {
                in_degree: AtomicU32::new(0),
                out_edges: Vec::new(),
            });
        }
        while self.ready.pop().is_some() {}
        self.consumed.store(0, Ordering::Release);
        self.total = n;
        self.stopped.store(false, Ordering::Release);
    }

    /// Records that `to` depends on `from`. Out-of-range ids are silently
    /// ignored; this is a guard, not a validated precondition, and callers
    /// must stay within the size passed to `init`.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) {
        let n = self.vertices.len();
        if from as usize >= n || to as usize >= n {
            debug!("ignore out-of-range edge {} -> {}", from, to);
            return;
        }
        self.vertices[from as usize].out_edges.push(to);
        self.vertices[to as usize]
            .in_degree
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Publishes every vertex whose in-degree is zero to the ready queue.
    /// Call once, after all edges are added and before the first `pop`.
    pub fn seal(&mut self) {
        for (id, vertex) in self.vertices.iter().enumerate() {
            if vertex.in_degree.load(Ordering::Relaxed) == 0 {
                self.ready.push(id as VertexId);
            }
        }
    }

    /// Takes a ready vertex, or `INVALID_ID` when none is available. With
    /// `blocking` the call parks until a vertex appears, every vertex has
    /// been consumed, or `stop` is called.
    pub fn pop(&self, blocking: bool) -> VertexId {
        loop {
            if let Some(id) = self.ready.pop() {
                return id;
            }
            if self.has_finished() || self.stopped.load(Ordering::Acquire) {
                return INVALID_ID;
            }
            if !blocking {
                return INVALID_ID;
            }
            let mut guard = self.wake_lock.lock();
            // Re-probe under the lock so a wakeup issued between the queue
            // probe and the wait is not lost. The wait is bounded either way.
            if self.ready.is_empty()
                && !self.has_finished()
                && !self.stopped.load(Ordering::Acquire)
            {
                self.wake.wait_for(&mut guard, POP_PARK_INTERVAL);
            }
        }
    }

    /// Reports that `id` has been fully processed, releasing its dependents.
    /// The first dependent that becomes ready is handed directly back as the
    /// return value (a fast path sparing one queue round trip); the rest go
    /// through the ready queue. Returns `INVALID_ID` when nothing became
    /// ready.
    pub fn consume(&self, id: VertexId) -> VertexId {
        let mut next = INVALID_ID;
        if let Some(vertex) = self.vertices.get(id as usize) {
            for &succ in &vertex.out_edges {
                let prev = self.vertices[succ as usize]
                    .in_degree
                    .fetch_sub(1, Ordering::AcqRel);
                if prev == 1 {
                    if next == INVALID_ID {
                        next = succ;
                    } else {
                        self.ready.push(succ);
                        self.wake.notify_one();
                    }
                }
            }
        } else {
            warn!("consume of out-of-range vertex {}", id);
        }
        let consumed = self.consumed.fetch_add(1, Ordering::AcqRel) + 1;
        if consumed >= self.total {
            self.wake.notify_all();
        }
        next
    }

    /// True once every vertex has been consumed exactly once.
    pub fn has_finished(&self) -> bool {
        self.consumed.load(Ordering::Acquire) >= self.total
    }

    /// Cooperative shutdown: all current and future blocked `pop` callers
    /// return `INVALID_ID` promptly. Does not discard the graph.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.wake.notify_all();
    }

    /// Discards all vertices. Exclusive access is required, so the shutdown
    /// sequence is `stop()` first, then `clear()` once workers have
    /// quiesced.
    pub fn clear(&mut self) {
        self.vertices.clear();
        while self.ready.pop().is_some() {}
        self.total = 0;
        self.consumed.store(0, Ordering::Release);
    }

    pub fn total(&self) -> u32 { self.total }
}

#[cfg(test)]
mod tests {
    use super::{ConflictGraph, VertexId, INVALID_ID};
    use std::{
        collections::HashSet,
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    #[test]
    fn empty_graph_finishes_immediately() {
        let mut graph = ConflictGraph::new();
        graph.init(0);
        graph.seal();
        assert!(graph.has_finished());
        assert_eq!(graph.pop(true), INVALID_ID);
    }

    #[test]
    fn chain_is_drained_in_order() {
        let mut graph = ConflictGraph::new();
        graph.init(3);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.seal();

        assert_eq!(graph.pop(false), 0);
        assert_eq!(graph.pop(false), INVALID_ID);
        // fast path hands the only newly-ready vertex straight back
        assert_eq!(graph.consume(0), 1);
        assert_eq!(graph.consume(1), 2);
        assert_eq!(graph.consume(2), INVALID_ID);
        assert!(graph.has_finished());
        assert_eq!(graph.pop(true), INVALID_ID);
    }

    #[test]
    fn diamond_releases_join_after_both_branches() {
        let mut graph = ConflictGraph::new();
        graph.init(4);
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(1, 3);
        graph.add_edge(2, 3);
        graph.seal();

        assert_eq!(graph.pop(false), 0);
        let first = graph.consume(0);
        let second = graph.pop(false);
        let mut branches = [first, second];
        branches.sort();
        assert_eq!(branches, [1, 2]);

        assert_eq!(graph.consume(first), INVALID_ID);
        assert_eq!(graph.pop(false), INVALID_ID);
        assert_eq!(graph.consume(second), 3);
        assert_eq!(graph.consume(3), INVALID_ID);
        assert!(graph.has_finished());
    }

    #[test]
    fn out_of_range_edge_is_ignored() {
        let mut graph = ConflictGraph::new();
        graph.init(2);
        graph.add_edge(0, 7);
        graph.add_edge(9, 1);
        graph.seal();

        let mut seen = vec![graph.pop(false), graph.pop(false)];
        seen.sort();
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn stop_wakes_blocked_pollers() {
        let mut graph = ConflictGraph::new();
        graph.init(2);
        graph.add_edge(0, 1);
        graph.seal();
        assert_eq!(graph.pop(false), 0);

        let graph = Arc::new(graph);
        let popper = {
            let graph = graph.clone();
            thread::spawn(move || graph.pop(true))
        };
        thread::sleep(Duration::from_millis(30));
        graph.stop();
        assert_eq!(popper.join().unwrap(), INVALID_ID);
    }

    /// Builds a layered DAG and drains it from a worker pool, checking that
    /// every vertex is visited exactly once and never before all of its
    /// predecessors were fully consumed.
    #[test]
    fn concurrent_drain_visits_each_vertex_once_in_topological_order() {
        const N: u32 = 400;
        const WORKERS: usize = 8;

        let mut graph = ConflictGraph::new();
        graph.init(N);
        let mut predecessors: Vec<Vec<VertexId>> = vec![Vec::new(); N as usize];
        // edges only point forward, so the graph is acyclic
        for i in 0..N {
            for j in [i + 3, i + 7, i + 13] {
                if j < N {
                    graph.add_edge(i, j);
                    predecessors[j as usize].push(i);
                }
            }
        }
        graph.seal();

        let graph = Arc::new(graph);
        let predecessors = Arc::new(predecessors);
        let fully_consumed: Arc<Vec<AtomicBool>> = Arc::new(
            (0..N).map(|_| AtomicBool::new(false)).collect::<Vec<_>>(),
        );
        let visits = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::new();
        for _ in 0..WORKERS {
            let graph = graph.clone();
            let predecessors = predecessors.clone();
            let fully_consumed = fully_consumed.clone();
            let visits = visits.clone();
            workers.push(thread::spawn(move || {
                let mut seen = HashSet::new();
                let mut id = graph.pop(true);
                while id != INVALID_ID {
                    assert!(seen.insert(id), "vertex {} popped twice", id);
                    for &pred in &predecessors[id as usize] {
                        assert!(
                            fully_consumed[pred as usize]
                                .load(Ordering::Acquire),
                            "vertex {} released before predecessor {}",
                            id,
                            pred
                        );
                    }
                    visits.fetch_add(1, Ordering::Relaxed);
                    fully_consumed[id as usize].store(true, Ordering::Release);
                    let next = graph.consume(id);
                    id = if next != INVALID_ID { next } else { graph.pop(true) };
                }
                seen
            }));
        }

        let mut all: HashSet<VertexId> = HashSet::new();
        for worker in workers {
            for id in worker.join().unwrap() {
                assert!(all.insert(id), "vertex {} visited by two workers", id);
            }
        }
        assert_eq!(all.len(), N as usize);
        assert_eq!(visits.load(Ordering::Relaxed), N as usize);
        assert!(graph.has_finished());
    }

    #[test]
    fn clear_resets_the_graph() {
        let mut graph = ConflictGraph::new();
        graph.init(2);
        graph.seal();
        graph.stop();
        graph.clear();
        assert_eq!(graph.total(), 0);
        assert!(graph.has_finished());
    }
}
