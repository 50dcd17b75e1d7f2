//! Configuration-side types for suitegraph: cycle offsets and clocks,
//! hierarchical node paths, boolean dependency expressions with their
//! simplifier, and the resolved suite definition handed to the graph.

mod offset;
pub use offset::CycleOffset;

mod clock;
pub use clock::Clock;

mod path;
pub use path::{relative_path, resolve_offset, Path, ResolvedPath};

mod depend;
pub use depend::{cost, simplify, Dependency, DependencyState};

mod suite;
pub use suite::{Metadata, NodeDef, NodeKind, SuiteDef};

use chrono::NaiveDateTime;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0} expression needs at least one operand")]
    EmptyExpression(&'static str),
    #[error("{0} dependency needs a non-empty path")]
    EmptyPath(&'static str),
    #[error("Relative path needs a non-empty {0}")]
    EmptyRelativePath(&'static str),
    #[error("Invalid clock: {0}")]
    InvalidClock(String),
    #[error("Offset {offset} is not a multiple of the clock step {step}")]
    OffsetNotOnClock { offset: CycleOffset, step: CycleOffset },
    #[error("{0} is not a cycle of the clock")]
    CycleNotOnClock(NaiveDateTime),
    #[error("{cycle} shifted by {offset} is outside the calendar")]
    OffsetOutOfRange { cycle: NaiveDateTime, offset: CycleOffset },
    #[error("\"{family}\" has more than one child named \"{name}\"")]
    DuplicateName { family: String, name: String },
    #[error("Invalid node name \"{0}\": names must be non-empty and contain no '.'")]
    InvalidName(String),
    #[error("Task \"{0}\" cannot have children")]
    TaskWithChildren(String),
    #[error("Only tasks can declare events; \"{0}\" is a family")]
    EventOnFamily(String),
}
