use workflow::{simplify, Dependency};

use crate::{Graph, Node, NodeId};

/// Condition under which `node` counts as finished without running:
/// its own completion clause or any ancestor's.
pub fn completes_for(node: &Node) -> Dependency {
    node.complete().clone()
}

/// Condition meaning "everything in this cycle is finished", for a synthetic
/// terminal task added under `root`.
///
/// A task is finished once it has completed or its completion clause holds.
/// A family is finished once it has completed, or once all of its children are
/// finished if any task below it has a completion clause.
/// Nodes that can never run are left out, and so is a terminal task that was
/// forced never to run.
///
/// Returns `None` if no task that might run has a completion clause,
/// in which case no terminal task is needed. A clause on a family only
/// counts through the tasks that inherit it.
pub fn final_task_dependency(graph: &Graph, root: NodeId) -> Option<Dependency> {
    let node = graph.node(root);
    let mut any_complete = false;
    let children: Vec<Dependency> = node
        .children
        .iter()
        .filter(|&&child| graph.node(child).might_complete())
        .map(|&child| {
            let (dep, has_complete) = contribution(graph, child);
            any_complete |= has_complete;
            dep
        })
        .collect();

    if !any_complete {
        return None;
    }
    Some(simplify(&Dependency::all(children)))
}

/// Finished-condition of the subtree at `id`, and whether any task in it
/// has a completion clause.
fn contribution(graph: &Graph, id: NodeId) -> (Dependency, bool) {
    let node = graph.node(id);
    let completed = Dependency::State {
        path: node.local_path(),
        state: workflow::DependencyState::Completed,
    };

    if node.is_task() {
        let complete = completes_for(node);
        return if complete.is_false() {
            (completed, false)
        } else {
            (completed | complete, true)
        };
    }

    let mut any_complete = false;
    let children: Vec<Dependency> = node
        .children
        .iter()
        .filter(|&&child| graph.node(child).might_complete())
        .map(|&child| {
            let (dep, has_complete) = contribution(graph, child);
            any_complete |= has_complete;
            dep
        })
        .collect();

    if any_complete {
        (completed | Dependency::all(children), true)
    } else {
        (completed, false)
    }
}
