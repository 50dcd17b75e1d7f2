//!
//! The types in this crate turn a [`workflow::SuiteDef`] and a [`workflow::Clock`]
//! into a graph of concrete nodes, one tree per cycle, ready to be emitted.
//!
//! A generation run uses the graph in 3 phases:
//! 1. [`Graph::add_cycle`] for every cycle under analysis, in increasing time order.
//!    Each node gets its effective trigger, complete and time by merging its own
//!    conditions with those of its ancestors.
//! 2. [`Graph::simplify_cycle`] for every cycle, in emission order. `CycleExists`
//!    conditions are folded against the clock, references to cycles that can never
//!    exist are dropped, and everything else must resolve to a node or an event.
//! 3. [`Graph::depth_first_traversal`] to walk each cycle for emission, pruning
//!    nodes that can never run.

mod id;
pub use id::NodeId;

/// resolved per-cycle nodes
mod node;
pub use node::Node;

/// the graph and its resolution passes
mod graph;
pub use graph::Graph;

/// pre/post-order walk with pruning
mod traversal;
pub use traversal::Visitor;

/// completion conditions over whole subtrees
mod complete;
pub use complete::{completes_for, final_task_dependency};

mod errors;
pub use errors::Errors;

use chrono::NaiveDateTime;
use workflow::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cycle {0} was already added")]
    CycleAlreadyAdded(NaiveDateTime),
    #[error("Cycle {cycle} added after later cycle {last}; cycles must be added in order")]
    CycleOutOfOrder {
        cycle: NaiveDateTime,
        last: NaiveDateTime,
    },
    #[error("Cycle {0} has not been added")]
    CycleNotAdded(NaiveDateTime),
    #[error("No node at {0}")]
    PathNotFound(Path),
    #[error("{declared_by} depends on {path}, which is not defined")]
    DanglingReference { path: Path, declared_by: Path },
    #[error("{declared_by} depends on event \"{event}\" of {path}, which does not declare it")]
    UndefinedEvent {
        path: Path,
        event: String,
        declared_by: Path,
    },
}
