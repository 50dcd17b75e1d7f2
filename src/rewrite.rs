use anyhow::Result;

use traverse::{Graph, NodeId};
use workflow::{Dependency, DependencyState};

use crate::Dialect;

/// Turns simplified dependencies into the primitives one scheduler supports.
/// Paths in the input and output are relative to the cycle of the node `id`
/// that declared the dependency.
pub trait Rewriter {
    fn dialect(&self) -> Dialect;

    /// The scheduler's name for `state`.
    fn state_name(&self, state: DependencyState) -> &'static str;

    /// Rewrite `dep`, declared by the node `id`.
    fn rewrite(&mut self, graph: &Graph, id: NodeId, dep: &Dependency) -> Result<Dependency>;

    /// What has to hold before the task `id` is submitted.
    fn task_dependency(&mut self, graph: &Graph, id: NodeId) -> Result<Dependency> {
        let trigger = graph.node(id).trigger().clone();
        self.rewrite(graph, id, &trigger)
    }
}
