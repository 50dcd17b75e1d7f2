use anyhow::{bail, Result};

use traverse::{Graph, NodeId};
use workflow::{relative_path, resolve_offset, simplify, Dependency, DependencyState, Path};

use crate::{Dialect, Error, Rewriter};

/// ecFlow understands family states and completion conditions natively,
/// so rewriting only checks that every reference resolves.
/// References are addressed relative to the node that declares them,
/// with each cycle in its own suite named by `cycle_format`.
#[derive(Debug, Clone)]
pub struct Ecflow {
    cycle_format: String,
}

/// What a single `State` or `Event` leaf looks like to ecFlow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRef {
    /// "./sibling", "../up/node" or "/suite/absolute/node".
    pub path: String,
    pub condition: Condition,
    /// The target lives in another cycle's suite, so it needs an extern declaration.
    pub external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    State(&'static str),
    Event(String),
}

impl Ecflow {
    pub fn new(cycle_format: &str) -> Self {
        Self {
            cycle_format: cycle_format.to_owned(),
        }
    }

    /// Address `leaf`, declared by node `id`, the way ecFlow expects.
    pub fn reference(&self, graph: &Graph, id: NodeId, leaf: &Dependency) -> Result<StateRef> {
        let (target, condition) = match leaf {
            Dependency::State { path, state } => (path, Condition::State(self.state_name(*state))),
            Dependency::Event { path, event } => (path, Condition::Event(event.to_string())),
            other => bail!("Not a state or event: {other}"),
        };
        let node = graph.node(id);
        let now = graph.clock().cycle_at(node.path.offset())?;
        let start = resolve_offset(now, &self.cycle_format, &node.local_path())?;
        let dest = resolve_offset(now, &self.cycle_format, target)?;
        Ok(StateRef {
            path: relative_path(&start.components, &dest.components)?,
            condition,
            external: dest.crosses_cycle,
        })
    }

    /// Fail on the first reference to a node that is not written out.
    fn check(&self, graph: &Graph, origin: &Path, dep: &Dependency) -> Result<(), Error> {
        let mut missing = None;
        dep.visit_leaves(&mut |leaf| match leaf {
            Dependency::State { path, .. } | Dependency::Event { path, .. } => {
                let target = path.shift(origin.offset());
                let emitted = graph
                    .get(&target)
                    .is_some_and(|id| graph.node(id).might_complete());
                if missing.is_none() && graph.has_cycle(target.offset()) && !emitted {
                    missing = Some(target);
                }
            }
            _ => (),
        });
        match missing {
            Some(path) => Err(Error::UndefinedPath {
                path,
                referenced_by: origin.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Rewriter for Ecflow {
    fn dialect(&self) -> Dialect {
        Dialect::Ecflow
    }

    fn state_name(&self, state: DependencyState) -> &'static str {
        match state {
            DependencyState::Completed => "complete",
            DependencyState::Running => "active",
            DependencyState::Failed => "aborted",
        }
    }

    fn rewrite(&mut self, graph: &Graph, id: NodeId, dep: &Dependency) -> Result<Dependency> {
        self.check(graph, &graph.node(id).path, dep)?;
        Ok(simplify(dep))
    }
}
