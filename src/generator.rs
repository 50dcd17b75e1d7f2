use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use colored::Colorize;

use traverse::{final_task_dependency, Errors, Graph, Node, NodeId, Visitor};
use util::Timer;
use workflow::{Dependency, Metadata, NodeKind, Path, SuiteDef};

use crate::{Dialect, Ecflow, Error, Rewriter, Rocoto, Settings};

/// A node as it should be written out, with conditions rewritten for the dialect.
/// Paths are relative to the node's own cycle.
#[derive(Debug, Clone)]
pub struct EmittedNode {
    pub path: Path,
    pub kind: NodeKind,
    pub trigger: Dependency,
    pub complete: Dependency,
    pub time: Option<Duration>,
    pub metadata: Metadata,
}

/// One step of the depth-first walk. Every `Enter` is matched by an `Exit`
/// after all of the node's descendants.
#[derive(Debug, Clone)]
pub enum Visit {
    Enter(EmittedNode),
    Exit(Path),
}

/// Everything an emitter needs to write out one cycle.
#[derive(Debug, Clone)]
pub struct CyclePlan {
    pub cycle: NaiveDateTime,
    /// The cycle formatted with `Settings::cycle_format`.
    pub name: String,
    pub visits: Vec<Visit>,
    /// The synthetic terminal task, if this cycle needs one.
    pub final_task: Option<Path>,
    /// What the terminal task waits for; `False` without a terminal task.
    pub final_dependency: Dependency,
    /// Nodes in cycles outside the analysis window that this cycle refers to,
    /// relative to this cycle.
    pub externs: Vec<Path>,
}

impl CyclePlan {
    pub fn entered(&self) -> impl Iterator<Item = &EmittedNode> {
        self.visits.iter().filter_map(|visit| match visit {
            Visit::Enter(node) => Some(node),
            Visit::Exit(_) => None,
        })
    }
}

/// Runs a whole generation: builds the graph for every cycle in the window,
/// resolves it, and produces one [`CyclePlan`] per cycle.
pub struct Generator {
    settings: Settings,
    suite: SuiteDef,
}

impl Generator {
    pub fn new(settings: Settings, suite: SuiteDef) -> Self {
        Self { settings, suite }
    }

    pub fn generate(&self) -> Result<Vec<CyclePlan>> {
        self.settings.validate()?;
        let cycles = self.settings.cycles();
        if self.settings.verbose > 0 {
            eprintln!(
                "Generating {} cycles for {:?}",
                cycles.len(),
                self.settings.dialect
            );
        }
        let mut timer = Timer::now();

        let mut graph = Graph::new(self.settings.clock.clone());
        for &cycle in &cycles {
            graph
                .add_cycle(&self.suite, cycle)
                .with_context(|| format!("Unable to add cycle {cycle}"))?;
        }
        log::info!(
            "Added {} cycles ({} nodes) in {:?}",
            cycles.len(),
            graph.len(),
            timer.lap()
        );

        for &cycle in &cycles {
            graph.simplify_cycle(cycle)?;
        }
        log::info!("Resolved dependencies in {:?}", timer.lap());

        let mut finals = Vec::with_capacity(cycles.len());
        for &cycle in &cycles {
            finals.push(self.prepare_final_task(&mut graph, cycle)?);
        }

        let mut rewriter: Box<dyn Rewriter> = match self.settings.dialect {
            Dialect::Rocoto => Box::new(Rocoto::new()),
            Dialect::Ecflow => Box::new(Ecflow::new(&self.settings.cycle_format)),
        };
        let mut plans = Vec::with_capacity(cycles.len());
        for (&cycle, final_task) in cycles.iter().zip(finals) {
            plans.push(self.plan(&graph, rewriter.as_mut(), cycle, final_task)?);
        }
        log::info!("Planned {} cycles in {:?}", plans.len(), timer.lap());
        Ok(plans)
    }

    /// Rocoto can't skip a task whose completion clause holds, so a cycle
    /// where any task might complete through its clause gets a terminal task
    /// that waits for the whole cycle to be finished.
    /// Returns its id if the cycle needs one.
    fn prepare_final_task(&self, graph: &mut Graph, cycle: NaiveDateTime) -> Result<Option<NodeId>> {
        if self.settings.dialect != Dialect::Rocoto {
            return Ok(None);
        }
        let name = &self.settings.final_task;
        let root = graph.root(cycle)?;
        let final_path = graph.node(root).path.child(name);
        let final_id = graph.get(&final_path);

        if final_task_dependency(graph, root).is_none() {
            return Ok(None);
        }

        let final_id = final_id.ok_or_else(|| Error::MissingFinalTask(name.clone()))?;
        let node = graph.node(final_id);
        if !node.is_task() {
            return Err(Error::FinalTaskIsFamily(name.clone()).into());
        }
        if !node.own_trigger.is_true() || !node.own_complete.is_false() || node.own_time.is_some() {
            return Err(Error::FinalTaskHasDependency(name.clone()).into());
        }
        graph.force_never_run(&final_path)?;
        Ok(Some(final_id))
    }

    fn plan(
        &self,
        graph: &Graph,
        rewriter: &mut dyn Rewriter,
        cycle: NaiveDateTime,
        final_task: Option<NodeId>,
    ) -> Result<CyclePlan> {
        let name = self.settings.cycle_name(cycle);
        log::debug!("planning {}", name.cyan());

        let mut builder = PlanBuilder {
            rewriter,
            visits: Vec::new(),
            errors: Errors::default(),
        };
        graph.depth_first_traversal(cycle, &mut builder)?;

        let final_dependency = match final_task.zip(final_task_dependency(graph, graph.root(cycle)?)) {
            Some((id, dep)) => match builder.rewriter.rewrite(graph, id, &dep) {
                Ok(rewritten) => rewritten,
                Err(e) => {
                    builder.errors.add_for(&graph.node(id).path, e);
                    dep
                }
            },
            None => Dependency::False,
        };
        builder.errors.print_recap(&format!("planning cycle {name}"))?;

        let offset = graph.clock().offset_of(cycle)?;
        let externs = graph.externs(cycle)?.map(|path| path.shift(-offset)).collect();
        Ok(CyclePlan {
            cycle,
            name,
            visits: builder.visits,
            final_task: final_task.map(|id| graph.node(id).local_path()),
            final_dependency,
            externs,
        })
    }
}

/// Collects the visits of one cycle, rewriting conditions as it goes.
struct PlanBuilder<'a> {
    rewriter: &'a mut dyn Rewriter,
    visits: Vec<Visit>,
    errors: Errors,
}

impl PlanBuilder<'_> {
    fn rewrite(&mut self, graph: &Graph, id: NodeId, node: &Node) -> Result<(Dependency, Dependency)> {
        let trigger = if node.is_task() {
            self.rewriter.task_dependency(graph, id)?
        } else {
            self.rewriter.rewrite(graph, id, node.trigger())?
        };
        let complete = self.rewriter.rewrite(graph, id, node.complete())?;
        Ok((trigger, complete))
    }
}

impl Visitor for PlanBuilder<'_> {
    fn enter(&mut self, graph: &Graph, id: NodeId, node: &Node) -> Result<()> {
        let (trigger, complete) = match self.rewrite(graph, id, node) {
            Ok(deps) => deps,
            Err(e) => {
                // report every bad node, not just the first:
                self.errors.add_for(&node.path, e);
                (node.trigger().clone(), node.complete().clone())
            }
        };
        log::trace!("{} {}", "enter".green(), node.path);
        self.visits.push(Visit::Enter(EmittedNode {
            path: node.local_path(),
            kind: node.kind,
            trigger,
            complete,
            time: node.time(),
            metadata: node.metadata.clone(),
        }));
        Ok(())
    }

    fn exit(&mut self, _graph: &Graph, _id: NodeId, node: &Node) -> Result<()> {
        self.visits.push(Visit::Exit(node.local_path()));
        Ok(())
    }
}
