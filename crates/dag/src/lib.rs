// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Basalt DAG Scheduler: a thread-safe producer/consumer protocol over a
//! precomputed transaction conflict graph. An upstream component decides
//! which transactions conflict and records the partial order as edges; a
//! worker pool then drains the graph with `pop`/`consume`, executing
//! non-conflicting transactions concurrently while every vertex is released
//! only after all of its predecessors have been consumed.

#[macro_use]
extern crate log;

mod conflict_graph;

pub use conflict_graph::{ConflictGraph, VertexId, INVALID_ID};
