use std::sync::{Arc, OnceLock};

use chrono::Duration;

use workflow::{simplify, Dependency, Metadata, NodeDef, NodeKind, Path};

use crate::NodeId;

/// A task or family instantiated for one cycle.
///
/// The `own_*` fields are what the suite declared for this node; the effective
/// trigger, complete and time also include every ancestor's conditions:
/// triggers are ANDed down the tree, completes are ORed, and times take the max.
/// Dependency paths are relative to the node's own cycle.
#[derive(Debug)]
pub struct Node {
    /// Offset of this node's cycle from the first cycle of the clock,
    /// followed by its names within the cycle.
    pub path: Path,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub own_trigger: Dependency,
    pub own_complete: Dependency,
    pub own_time: Option<Duration>,
    pub events: Vec<Arc<str>>,
    pub metadata: Metadata,

    trigger: Dependency,
    complete: Dependency,
    time: Option<Duration>,

    never_run: bool,
    might_complete: OnceLock<bool>,
    always_complete: OnceLock<bool>,
}

impl Node {
    pub(crate) fn new(def: &NodeDef, path: Path, parent: Option<(NodeId, &Node)>) -> Self {
        let (trigger, complete, time) = match parent {
            Some((_, p)) => (
                merge_trigger(&p.trigger, &def.trigger),
                merge_complete(&p.complete, &def.complete),
                p.time.max(def.time),
            ),
            None => (def.trigger.clone(), def.complete.clone(), def.time),
        };
        Self {
            path,
            kind: def.kind,
            parent: parent.map(|(id, _)| id),
            children: Vec::with_capacity(def.children.len()),
            own_trigger: def.trigger.clone(),
            own_complete: def.complete.clone(),
            own_time: def.time,
            events: def.events.clone(),
            metadata: def.metadata.clone(),
            trigger,
            complete,
            time,
            never_run: false,
            might_complete: OnceLock::new(),
            always_complete: OnceLock::new(),
        }
    }

    #[inline]
    pub fn is_task(&self) -> bool {
        self.kind == NodeKind::Task
    }

    #[inline]
    pub fn is_family(&self) -> bool {
        self.kind == NodeKind::Family
    }

    /// The node's location in its own cycle (offset zero).
    pub fn local_path(&self) -> Path {
        self.path.with_offset(Default::default())
    }

    /// Effective trigger: this node's and every ancestor's.
    #[inline]
    pub fn trigger(&self) -> &Dependency {
        &self.trigger
    }

    /// Effective completion condition: this node's or any ancestor's.
    #[inline]
    pub fn complete(&self) -> &Dependency {
        &self.complete
    }

    /// Latest of this node's and its ancestors' earliest start times.
    #[inline]
    pub fn time(&self) -> Option<Duration> {
        self.time
    }

    pub fn has_event(&self, event: &str) -> bool {
        self.is_task() && self.events.iter().any(|e| &**e == event)
    }

    /// False if this node can provably never run.
    pub fn might_complete(&self) -> bool {
        *self
            .might_complete
            .get_or_init(|| !self.never_run && !simplify(&self.trigger).is_false())
    }

    /// True if this node is always treated as already complete.
    pub fn always_complete(&self) -> bool {
        *self
            .always_complete
            .get_or_init(|| simplify(&self.complete).is_true())
    }

    #[inline]
    pub fn is_never_run(&self) -> bool {
        self.never_run
    }

    pub(crate) fn set_effective(&mut self, trigger: Dependency, complete: Dependency) {
        self.trigger = trigger;
        self.complete = complete;
        self.might_complete = OnceLock::new();
        self.always_complete = OnceLock::new();
    }

    pub(crate) fn set_never_run(&mut self) {
        self.never_run = true;
        self.might_complete = OnceLock::new();
    }
}

fn merge_trigger(inherited: &Dependency, own: &Dependency) -> Dependency {
    match (inherited, own) {
        (Dependency::True, dep) | (dep, Dependency::True) => dep.clone(),
        (a, b) => a.clone() & b.clone(),
    }
}

fn merge_complete(inherited: &Dependency, own: &Dependency) -> Dependency {
    match (inherited, own) {
        (Dependency::False, dep) | (dep, Dependency::False) => dep.clone(),
        (a, b) => a.clone() | b.clone(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use workflow::CycleOffset;

    fn done(path: &str) -> Dependency {
        Dependency::completed(Path::dotted(path)).unwrap()
    }

    #[test]
    fn test_inheritance() {
        let fam_def = NodeDef::family("fam")
            .with_trigger(done("a"))
            .with_complete(done("b"))
            .with_time(Duration::hours(2));
        let task_def = NodeDef::task("t")
            .with_trigger(done("c"))
            .with_time(Duration::hours(1));

        let at = CycleOffset::hours(6);
        let fam = Node::new(&fam_def, Path::dotted_at(at, "fam"), None);
        let task = Node::new(&task_def, Path::dotted_at(at, "fam.t"), Some((NodeId::from(0), &fam)));

        assert_eq!(task.trigger(), &(done("a") & done("c")));
        assert_eq!(task.complete(), &done("b"));
        assert_eq!(task.time(), Some(Duration::hours(2)));
        assert_eq!(task.own_trigger, done("c"));
        assert_eq!(task.parent, Some(NodeId::from(0)));
        assert_eq!(task.local_path(), Path::dotted("fam.t"));
    }

    #[test]
    fn test_reachability() {
        let def = NodeDef::task("t").with_trigger(Dependency::False & done("a"));
        let mut node = Node::new(&def, Path::dotted("t"), None);
        assert!(!node.might_complete());
        assert!(!node.always_complete());

        node.set_effective(done("a"), Dependency::True | done("b"));
        assert!(node.might_complete());
        assert!(node.always_complete());

        node.set_never_run();
        assert!(!node.might_complete());
    }
}
