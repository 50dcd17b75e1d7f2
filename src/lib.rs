//! suitegraph builds the per-cycle dependency graph of a cyclic workflow suite
//! and rewrites its conditions for a target job scheduler.
//!
//! ```text
//! SuiteDef + Settings -> Graph (traverse) -> Rewriter (rocoto | ecflow) -> CyclePlan
//! ```
//! Emitting the scheduler's actual text or XML from a [`CyclePlan`] is left to the caller.

/// Settings for one generation run
mod settings;
/// Common interface of the scheduler-specific rewriters
mod rewrite;
/// Rewriter for Rocoto, which has no family states or completion escapes
mod rocoto;
/// Rewriter for ecFlow, which addresses nodes by relative path
mod ecflow;
/// Whole-suite generation pipeline
mod generator;

use std::fmt;

pub use ecflow::{Condition, Ecflow, StateRef};
pub use generator::{CyclePlan, EmittedNode, Generator, Visit};
pub use rewrite::Rewriter;
pub use rocoto::Rocoto;
pub use settings::{Dialect, Settings};

pub use traverse::{Graph, Node, NodeId};
pub use workflow::{
    simplify, Clock, CycleOffset, Dependency, DependencyState, NodeDef, NodeKind, Path, SuiteDef,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Self-referential dependency: {0}")]
    SelfReference(Chain),
    #[error("{referenced_by} depends on {path}, which is not defined")]
    UndefinedPath { path: Path, referenced_by: Path },
    #[error("Suite has completion conditions, so it needs a top-level task named \"{0}\"")]
    MissingFinalTask(String),
    #[error("\"{0}\" must be a task, not a family")]
    FinalTaskIsFamily(String),
    #[error("\"{0}\" must have no trigger, complete or time of its own")]
    FinalTaskHasDependency(String),
}

/// Paths through which a dependency leads back to where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain(pub Vec<Path>);

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{path}")?;
        }
        Ok(())
    }
}

/// Send logs to stderr at the level `settings.verbose` asks for.
pub fn init_logging(settings: &Settings) {
    simple_logging::log_to_stderr(settings.log_level());
}
