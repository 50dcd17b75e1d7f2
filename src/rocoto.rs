use anyhow::Result;
use colored::Colorize;

use traverse::{completes_for, Graph, NodeId};
use util::HashMap;
use workflow::{simplify, Dependency, DependencyState, Path};

use crate::{Chain, Dialect, Error, Rewriter};

/// Rocoto can only test task states, and has no notion of a node that is
/// complete without running. So a family's running state becomes "any task
/// below it is running", and waiting on a node with a completion clause also
/// accepts that clause.
///
/// One `Rocoto` is meant to be used for a single generation run; expansions
/// are cached by dependency and path for the lifetime of the value.
#[derive(Debug, Default)]
pub struct Rocoto {
    /// expanded form of each `State` seen so far, keyed by graph path.
    memo: HashMap<Dependency, Dependency>,
    /// expanded completion clause of each node that has one.
    escapes: HashMap<Path, Dependency>,
    /// clauses being expanded, innermost last.
    in_progress: Vec<Path>,
}

impl Rocoto {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite `dep`, declared by node `id`, into task-level states.
    /// Fails if the rewrite would make `id` wait on itself.
    pub fn rocotoify(&mut self, graph: &Graph, id: NodeId, dep: &Dependency) -> Result<Dependency> {
        let origin = &graph.node(id).path;
        let offset = origin.offset();
        let absolute = dep.shift(offset);

        self.in_progress.clear();
        let expanded = self.expand(graph, origin, &absolute)?;
        self.check_self_reference(graph, origin, &absolute)?;

        let rewritten = simplify(&expanded.shift(-offset));
        log::trace!("{}: {dep} => {rewritten}", origin.to_string().cyan());
        Ok(rewritten)
    }

    fn expand(&mut self, graph: &Graph, referenced_by: &Path, dep: &Dependency) -> Result<Dependency> {
        Ok(match dep {
            Dependency::Not(inner) => !self.expand(graph, referenced_by, inner)?,
            Dependency::And(deps) => Dependency::and(self.expand_all(graph, referenced_by, deps)?)?,
            Dependency::Or(deps) => Dependency::or(self.expand_all(graph, referenced_by, deps)?)?,
            Dependency::State { path, state } => {
                self.expand_state(graph, referenced_by, dep, path, *state)?
            }
            leaf => leaf.clone(),
        })
    }

    fn expand_all(
        &mut self,
        graph: &Graph,
        referenced_by: &Path,
        deps: &[Dependency],
    ) -> Result<Vec<Dependency>> {
        deps.iter()
            .map(|dep| self.expand(graph, referenced_by, dep))
            .collect()
    }

    fn expand_state(
        &mut self,
        graph: &Graph,
        referenced_by: &Path,
        dep: &Dependency,
        path: &Path,
        state: DependencyState,
    ) -> Result<Dependency> {
        if !graph.has_cycle(path.offset()) {
            // extern; its own cycle's plan expands it.
            return Ok(dep.clone());
        }
        if let Some(done) = self.memo.get(dep) {
            return Ok(done.clone());
        }
        let target = graph.get(path).ok_or_else(|| Error::UndefinedPath {
            path: path.clone(),
            referenced_by: referenced_by.clone(),
        })?;
        let node = graph.node(target);
        if !node.might_complete() {
            // pruned, so never written out:
            return Err(Error::UndefinedPath {
                path: path.clone(),
                referenced_by: referenced_by.clone(),
            }
            .into());
        }

        let expanded = match state {
            DependencyState::Running if node.is_family() => Dependency::any(
                graph
                    .descendant_tasks(target)
                    .into_iter()
                    .filter(|&task| graph.node(task).might_complete())
                    .map(|task| Dependency::State {
                        path: graph.node(task).path.clone(),
                        state,
                    }),
            ),
            DependencyState::Completed if !node.complete().is_false() => {
                dep.clone() | self.escape(graph, target)?
            }
            _ => dep.clone(),
        };
        self.memo.insert(dep.clone(), expanded.clone());
        Ok(expanded)
    }

    /// Expanded completion clause of `id`, in graph paths.
    fn escape(&mut self, graph: &Graph, id: NodeId) -> Result<Dependency> {
        let path = &graph.node(id).path;
        if let Some(done) = self.escapes.get(path) {
            return Ok(done.clone());
        }
        if let Some(start) = self.in_progress.iter().position(|p| p == path) {
            let mut chain = self.in_progress[start..].to_vec();
            chain.push(path.clone());
            return Err(Error::SelfReference(Chain(chain)).into());
        }

        let clause = completes_for(graph.node(id)).shift(path.offset());
        self.in_progress.push(path.clone());
        let expanded = self.expand(graph, path, &clause);
        self.in_progress.pop();

        let expanded = expanded?;
        self.escapes.insert(path.clone(), expanded.clone());
        Ok(expanded)
    }

    /// Fail if a completion clause reached from `dep` leads back to `origin`.
    fn check_self_reference(&self, graph: &Graph, origin: &Path, dep: &Dependency) -> Result<()> {
        match self.next_hop(origin, dep, &[]) {
            Some(via) => Err(Error::SelfReference(Chain(self.chain(graph, origin, via))).into()),
            None => Ok(()),
        }
    }

    /// First completed state in `dep` whose clause leads to `origin`.
    fn next_hop(&self, origin: &Path, dep: &Dependency, seen: &[Path]) -> Option<Path> {
        let mut found = None;
        dep.visit_leaves(&mut |leaf| {
            if let Dependency::State {
                path,
                state: DependencyState::Completed,
            } = leaf
            {
                let leads_back = self.escapes.get(path).is_some_and(|e| e.references(origin));
                if found.is_none() && leads_back && !seen.contains(path) {
                    found = Some(path.clone());
                }
            }
        });
        found
    }

    /// Follow completion clauses from `via` until one names `origin` itself.
    fn chain(&self, graph: &Graph, origin: &Path, via: Path) -> Vec<Path> {
        let mut chain = vec![origin.clone(), via];
        while let Some(current) = chain.last().and_then(|p| graph.get(p)) {
            let node = graph.node(current);
            let clause = completes_for(node).shift(node.path.offset());
            if clause.references(origin) {
                break;
            }
            match self.next_hop(origin, &clause, &chain) {
                Some(next) => chain.push(next),
                None => break,
            }
        }
        chain.push(origin.clone());
        chain
    }
}

impl Rewriter for Rocoto {
    fn dialect(&self) -> Dialect {
        Dialect::Rocoto
    }

    fn state_name(&self, state: DependencyState) -> &'static str {
        match state {
            DependencyState::Completed => "SUCCEEDED",
            DependencyState::Failed => "DEAD",
            DependencyState::Running => "RUNNING",
        }
    }

    fn rewrite(&mut self, graph: &Graph, id: NodeId, dep: &Dependency) -> Result<Dependency> {
        self.rocotoify(graph, id, dep)
    }

    /// A task that is already complete through its clause is never submitted.
    fn task_dependency(&mut self, graph: &Graph, id: NodeId) -> Result<Dependency> {
        let node = graph.node(id);
        let dep = match node.complete() {
            Dependency::False => node.trigger().clone(),
            complete => node.trigger().clone() & !complete.clone(),
        };
        self.rocotoify(graph, id, &dep)
    }
}
