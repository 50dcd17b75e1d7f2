//! Boolean dependency expressions and their algebraic simplification.
//!
//! A [`Dependency`] is an immutable tree. Composite variants share their
//! operands through `Arc`s, so cloning an expression (or handing the same
//! one to many nodes) never copies the tree.

use std::fmt;
use std::ops;
use std::sync::Arc;

use crate::{CycleOffset, Error, Path};

mod simplify;
pub use simplify::{cost, simplify};

/// The observable states of a job.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum DependencyState {
    Running,
    Completed,
    Failed,
}

impl DependencyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Dependency {
    True,
    False,
    /// The node at `path` is in `state`.
    State { path: Path, state: DependencyState },
    /// The event named `event` under the task at `path` has fired.
    Event { path: Path, event: Arc<str> },
    /// The cycle at this offset from the current one exists.
    CycleExists(CycleOffset),
    Not(Arc<Dependency>),
    /// Never empty. Order is significant for equality.
    And(Arc<[Dependency]>),
    /// Never empty. Order is significant for equality.
    Or(Arc<[Dependency]>),
}

// construction ///////////////
impl Dependency {
    pub fn state(path: Path, state: DependencyState) -> Result<Self, Error> {
        if path.is_root() {
            return Err(Error::EmptyPath("State"));
        }
        Ok(Self::State { path, state })
    }

    pub fn completed(path: Path) -> Result<Self, Error> {
        Self::state(path, DependencyState::Completed)
    }

    pub fn running(path: Path) -> Result<Self, Error> {
        Self::state(path, DependencyState::Running)
    }

    pub fn failed(path: Path) -> Result<Self, Error> {
        Self::state(path, DependencyState::Failed)
    }

    pub fn event(path: Path, event: &str) -> Result<Self, Error> {
        if path.is_root() {
            return Err(Error::EmptyPath("Event"));
        }
        Ok(Self::Event {
            path,
            event: Arc::from(event),
        })
    }

    #[inline]
    pub fn cycle_exists(dt: CycleOffset) -> Self {
        Self::CycleExists(dt)
    }

    /// Conjunction of `deps`, which must not be empty.
    pub fn and<I: IntoIterator<Item = Dependency>>(deps: I) -> Result<Self, Error> {
        let deps: Arc<[Dependency]> = deps.into_iter().collect();
        if deps.is_empty() {
            return Err(Error::EmptyExpression("And"));
        }
        Ok(Self::And(deps))
    }

    /// Disjunction of `deps`, which must not be empty.
    pub fn or<I: IntoIterator<Item = Dependency>>(deps: I) -> Result<Self, Error> {
        let deps: Arc<[Dependency]> = deps.into_iter().collect();
        if deps.is_empty() {
            return Err(Error::EmptyExpression("Or"));
        }
        Ok(Self::Or(deps))
    }

    /// Conjunction that treats no operands as `True`.
    pub fn all<I: IntoIterator<Item = Dependency>>(deps: I) -> Self {
        Self::and(deps).unwrap_or(Self::True)
    }

    /// Disjunction that treats no operands as `False`.
    pub fn any<I: IntoIterator<Item = Dependency>>(deps: I) -> Self {
        Self::or(deps).unwrap_or(Self::False)
    }
}

// inspection ///////////////
impl Dependency {
    #[inline]
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    #[inline]
    pub fn is_false(&self) -> bool {
        matches!(self, Self::False)
    }

    /// Operands of an `And` or `Or`; empty for anything else.
    pub fn operands(&self) -> &[Dependency] {
        match self {
            Self::And(deps) | Self::Or(deps) => deps,
            _ => &[],
        }
    }

    /// Call `f` on every leaf (anything but `Not`, `And` and `Or`), left to right.
    pub fn visit_leaves<'a, F: FnMut(&'a Dependency)>(&'a self, f: &mut F) {
        match self {
            Self::Not(dep) => dep.visit_leaves(f),
            Self::And(deps) | Self::Or(deps) => {
                for dep in deps.iter() {
                    dep.visit_leaves(f);
                }
            }
            leaf => f(leaf),
        }
    }

    /// True if any `State` or `Event` leaf points at `path`.
    pub fn references(&self, path: &Path) -> bool {
        let mut found = false;
        self.visit_leaves(&mut |leaf| match leaf {
            Self::State { path: p, .. } | Self::Event { path: p, .. } => found |= p == path,
            _ => (),
        });
        found
    }

    /// Evaluate with short-circuit semantics, asking `leaf` for the value
    /// of every `State`, `Event` and `CycleExists` actually reached.
    pub fn evaluate<F: FnMut(&Dependency) -> bool>(&self, leaf: &mut F) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Not(dep) => !dep.evaluate(leaf),
            Self::And(deps) => deps.iter().all(|dep| dep.evaluate(leaf)),
            Self::Or(deps) => deps.iter().any(|dep| dep.evaluate(leaf)),
            other => leaf(other),
        }
    }
}

// transformation ///////////////
impl Dependency {
    /// Rebuild this expression with every leaf replaced by `f(leaf)`.
    /// The shape of `Not`/`And`/`Or` nodes is kept as-is; no simplification happens here.
    pub fn try_map_leaves<E, F>(&self, f: &mut F) -> Result<Dependency, E>
    where
        F: FnMut(&Dependency) -> Result<Dependency, E>,
    {
        Ok(match self {
            Self::Not(dep) => Self::Not(Arc::new(dep.try_map_leaves(f)?)),
            Self::And(deps) => Self::And(map_all(deps, f)?),
            Self::Or(deps) => Self::Or(map_all(deps, f)?),
            leaf => f(leaf)?,
        })
    }

    /// Infallible version of [`Self::try_map_leaves`].
    pub fn map_leaves<F: FnMut(&Dependency) -> Dependency>(&self, f: &mut F) -> Dependency {
        let res: Result<_, std::convert::Infallible> = self.try_map_leaves(&mut |leaf| Ok(f(leaf)));
        match res {
            Ok(dep) => dep,
            Err(never) => match never {},
        }
    }

    /// Re-express this dependency from a cycle `dt` earlier:
    /// every path and `CycleExists` offset moves by `dt`.
    pub fn shift(&self, dt: CycleOffset) -> Dependency {
        if dt.is_zero() {
            return self.clone();
        }
        self.map_leaves(&mut |leaf| match leaf {
            Self::State { path, state } => Self::State {
                path: path.shift(dt),
                state: *state,
            },
            Self::Event { path, event } => Self::Event {
                path: path.shift(dt),
                event: event.clone(),
            },
            Self::CycleExists(offset) => Self::CycleExists(*offset + dt),
            other => other.clone(),
        })
    }
}

fn map_all<E, F>(deps: &[Dependency], f: &mut F) -> Result<Arc<[Dependency]>, E>
where
    F: FnMut(&Dependency) -> Result<Dependency, E>,
{
    deps.iter().map(|dep| dep.try_map_leaves(f)).collect()
}

// operators ///////////////
impl ops::BitAnd for Dependency {
    type Output = Dependency;
    fn bitand(self, rhs: Self) -> Self {
        Self::And(Arc::from(vec![self, rhs]))
    }
}

impl ops::BitOr for Dependency {
    type Output = Dependency;
    fn bitor(self, rhs: Self) -> Self {
        Self::Or(Arc::from(vec![self, rhs]))
    }
}

impl ops::Not for Dependency {
    type Output = Dependency;
    fn not(self) -> Self {
        Self::Not(Arc::new(self))
    }
}

// display ///////////////
impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
            Self::State { path, state } => write!(f, "{path}:{}", state.as_str()),
            Self::Event { path, event } => write!(f, "{path}:event({event})"),
            Self::CycleExists(dt) => write!(f, "cycle_exists({dt})"),
            Self::Not(dep) => match &**dep {
                Self::And(_) | Self::Or(_) => write!(f, "!({dep})"),
                _ => write!(f, "!{dep}"),
            },
            Self::And(deps) => write_joined(f, deps, " & ", |d| matches!(d, Self::Or(_))),
            Self::Or(deps) => write_joined(f, deps, " | ", |d| matches!(d, Self::And(_))),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    deps: &[Dependency],
    sep: &str,
    needs_parens: impl Fn(&Dependency) -> bool,
) -> fmt::Result {
    for (i, dep) in deps.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        if needs_parens(dep) {
            write!(f, "({dep})")?;
        } else {
            write!(f, "{dep}")?;
        }
    }
    Ok(())
}
