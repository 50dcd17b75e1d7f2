use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use colored::Colorize;

use util::{HashMap, IdVec};
use workflow::{simplify, Clock, CycleOffset, Dependency, NodeDef, Path, SuiteDef};

use crate::{Error, Errors, Node, NodeId};

/// Every node of every cycle under analysis.
#[derive(Debug)]
pub struct Graph {
    clock: Clock,
    nodes: IdVec<NodeId, Node>,
    index: HashMap<Path, NodeId>,
    cycles: BTreeMap<CycleOffset, CycleEntry>,
}

#[derive(Debug)]
struct CycleEntry {
    cycle: NaiveDateTime,
    root: NodeId,
    /// all nodes of the cycle, in pre-order.
    ids: Vec<NodeId>,
    simplified: bool,
    /// references into cycles on the clock that were not added.
    externs: BTreeSet<Path>,
}

impl Graph {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            nodes: IdVec::default(),
            index: util::hash_map(0),
            cycles: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Instantiate `suite` for `cycle`, which must lie on the clock and come
    /// after every cycle added so far. Returns the id of the cycle's root.
    pub fn add_cycle(&mut self, suite: &SuiteDef, cycle: NaiveDateTime) -> Result<NodeId> {
        let offset = self.clock.offset_of(cycle)?;
        if self.cycles.contains_key(&offset) {
            return Err(Error::CycleAlreadyAdded(cycle).into());
        }
        if let Some((&last, entry)) = self.cycles.iter().next_back() {
            if last > offset {
                return Err(Error::CycleOutOfOrder {
                    cycle,
                    last: entry.cycle,
                }
                .into());
            }
        }

        let mut ids = Vec::new();
        let root = self.instantiate(suite.root(), Path::root(offset), None, &mut ids);
        log::debug!("added cycle {cycle} with {} nodes", ids.len());
        self.cycles.insert(
            offset,
            CycleEntry {
                cycle,
                root,
                ids,
                simplified: false,
                externs: BTreeSet::new(),
            },
        );
        Ok(root)
    }

    fn instantiate(
        &mut self,
        def: &NodeDef,
        path: Path,
        parent: Option<NodeId>,
        ids: &mut Vec<NodeId>,
    ) -> NodeId {
        let node = Node::new(def, path.clone(), parent.map(|p| (p, self.nodes.get(p))));
        log::trace!("{}: {}", path.to_string().cyan(), node.trigger());
        let id = self.nodes.push(node);
        self.index.insert(path.clone(), id);
        ids.push(id);

        for child in &def.children {
            let child_id = self.instantiate(child, path.child(&child.name), Some(id), ids);
            self.nodes.get_mut(id).children.push(child_id);
        }
        id
    }

    /// Resolve the effective trigger and complete of every node in `cycle`:
    /// fold `CycleExists` against the clock, simplify, drop references to
    /// cycles off the clock, and check everything left resolves.
    /// On failure no node of the cycle is changed.
    pub fn simplify_cycle(&mut self, cycle: NaiveDateTime) -> Result<()> {
        let offset = self.clock.offset_of(cycle)?;
        let entry = self
            .cycles
            .get(&offset)
            .ok_or(Error::CycleNotAdded(cycle))?;

        let mut errors = Errors::default();
        let mut externs = BTreeSet::new();
        let mut resolved = Vec::with_capacity(entry.ids.len());

        for &id in &entry.ids {
            let node = self.nodes.get(id);
            let mut resolve = |dep: &Dependency| -> Option<Dependency> {
                match self.resolve(cycle, node, dep, &mut externs, &mut errors) {
                    Ok(dep) => Some(dep),
                    Err(e) => {
                        errors.add(e);
                        None
                    }
                }
            };
            if let (Some(trigger), Some(complete)) =
                (resolve(node.trigger()), resolve(node.complete()))
            {
                log::trace!(
                    "{}: trigger {trigger}, complete {complete}",
                    node.path.to_string().cyan()
                );
                resolved.push((id, trigger, complete));
            }
        }
        errors.print_recap(&format!("resolving cycle {cycle}"))?;

        for (id, trigger, complete) in resolved {
            self.nodes.get_mut(id).set_effective(trigger, complete);
        }
        if !externs.is_empty() {
            log::debug!("cycle {cycle} refers to {} nodes outside the analysis", externs.len());
        }
        if let Some(entry) = self.cycles.get_mut(&offset) {
            entry.simplified = true;
            entry.externs = externs;
        }
        Ok(())
    }

    /// Bad references are added to `errors`, one per leaf.
    fn resolve(
        &self,
        cycle: NaiveDateTime,
        node: &Node,
        dep: &Dependency,
        externs: &mut BTreeSet<Path>,
        errors: &mut Errors,
    ) -> Result<Dependency> {
        let clock = &self.clock;

        // cycle_exists(dt) is decided by the clock alone:
        let folded = dep.try_map_leaves(&mut |leaf| -> Result<_, workflow::Error> {
            match leaf {
                Dependency::CycleExists(dt) => Ok(bool_dep(clock.contains(cycle, *dt)?)),
                other => Ok(other.clone()),
            }
        });
        let folded = folded.with_context(|| format!("Invalid dependency in {}", node.path))?;
        let mut dep = simplify(&folded);

        // a node in a cycle that can never exist can never reach any state:
        let mut impossible = false;
        let pruned = dep.try_map_leaves(&mut |leaf| -> Result<_, workflow::Error> {
            match leaf {
                Dependency::State { path, .. } | Dependency::Event { path, .. } => {
                    if clock.contains(cycle, path.offset())? {
                        Ok(leaf.clone())
                    } else {
                        impossible = true;
                        Ok(Dependency::False)
                    }
                }
                other => Ok(other.clone()),
            }
        });
        let pruned = pruned.with_context(|| format!("Invalid dependency in {}", node.path))?;
        if impossible {
            dep = simplify(&pruned);
        }

        dep.visit_leaves(&mut |leaf| {
            if let Err(e) = self.check_reference(node, leaf, externs) {
                errors.add(e.into());
            }
        });
        Ok(dep)
    }

    /// Fail if a `State`/`Event` in an added cycle does not resolve;
    /// remember it as an extern if its cycle was not added.
    fn check_reference(
        &self,
        node: &Node,
        leaf: &Dependency,
        externs: &mut BTreeSet<Path>,
    ) -> Result<(), Error> {
        let (path, event) = match leaf {
            Dependency::State { path, .. } => (path, None),
            Dependency::Event { path, event } => (path, Some(event)),
            _ => return Ok(()),
        };
        let target = path.shift(node.path.offset());
        if !self.cycles.contains_key(&target.offset()) {
            externs.insert(target);
            return Ok(());
        }
        let found = self.index.get(&target).map(|&id| self.nodes.get(id));
        match (found, event) {
            (None, _) => Err(Error::DanglingReference {
                path: target,
                declared_by: node.path.clone(),
            }),
            (Some(found), Some(event)) if !found.has_event(event) => Err(Error::UndefinedEvent {
                path: target,
                event: event.to_string(),
                declared_by: node.path.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Mark the node at `path` as if it could never run.
    pub fn force_never_run(&mut self, path: &Path) -> Result<()> {
        let id = self.get(path).ok_or_else(|| Error::PathNotFound(path.clone()))?;
        log::debug!("forcing {} to never run", path.to_string().cyan());
        self.nodes.get_mut(id).set_never_run();
        Ok(())
    }
}

// lookups ///////////////
impl Graph {
    /// Node at `path`, an offset from the clock start plus names.
    pub fn get(&self, path: &Path) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    pub fn root(&self, cycle: NaiveDateTime) -> Result<NodeId> {
        Ok(self.entry(cycle)?.root)
    }

    /// `path`, relative to `id`'s cycle, as a graph key.
    pub fn absolute(&self, id: NodeId, path: &Path) -> Path {
        path.shift(self.node(id).path.offset())
    }

    /// Tasks strictly below `id`, in pre-order.
    pub fn descendant_tasks(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            let node = self.node(next);
            if node.is_task() {
                found.push(next);
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }

    /// True if `offset` (from the clock start) names an added cycle.
    pub fn has_cycle(&self, offset: CycleOffset) -> bool {
        self.cycles.contains_key(&offset)
    }

    /// Every node of `cycle`, in pre-order.
    pub fn cycle_nodes(&self, cycle: NaiveDateTime) -> Result<&[NodeId]> {
        Ok(&self.entry(cycle)?.ids)
    }

    pub fn is_simplified(&self, cycle: NaiveDateTime) -> Result<bool> {
        Ok(self.entry(cycle)?.simplified)
    }

    /// Nodes in cycles on the clock but not under analysis that `cycle` depends on.
    pub fn externs(&self, cycle: NaiveDateTime) -> Result<impl Iterator<Item = &Path> + '_> {
        Ok(self.entry(cycle)?.externs.iter())
    }

    /// Added cycles, earliest first.
    pub fn cycles(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.cycles.values().map(|entry| entry.cycle)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn entry(&self, cycle: NaiveDateTime) -> Result<&CycleEntry> {
        let offset = self.clock.offset_of(cycle)?;
        Ok(self.cycles.get(&offset).ok_or(Error::CycleNotAdded(cycle))?)
    }
}

fn bool_dep(value: bool) -> Dependency {
    if value {
        Dependency::True
    } else {
        Dependency::False
    }
}
