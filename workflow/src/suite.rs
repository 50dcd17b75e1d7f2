use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;

use crate::{Dependency, Error, Path};

/// Opaque key/value pairs passed through to emitters untouched.
pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Task,
    Family,
}

/// One node of the suite as resolved by the configuration layer.
/// Dependency paths are relative to the cycle the node runs in.
#[derive(Debug, Clone)]
pub struct NodeDef {
    pub name: String,
    pub kind: NodeKind,
    pub trigger: Dependency,
    pub complete: Dependency,
    /// Earliest start, measured from the cycle time.
    pub time: Option<Duration>,
    pub events: Vec<Arc<str>>,
    pub metadata: Metadata,
    pub children: Vec<NodeDef>,
}

impl NodeDef {
    fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            trigger: Dependency::True,
            complete: Dependency::False,
            time: None,
            events: Vec::new(),
            metadata: Metadata::new(),
            children: Vec::new(),
        }
    }

    pub fn task(name: &str) -> Self {
        Self::new(name, NodeKind::Task)
    }

    pub fn family(name: &str) -> Self {
        Self::new(name, NodeKind::Family)
    }

    pub fn with_trigger(mut self, trigger: Dependency) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_complete(mut self, complete: Dependency) -> Self {
        self.complete = complete;
        self
    }

    pub fn with_time(mut self, time: Duration) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_event(mut self, event: &str) -> Self {
        self.events.push(Arc::from(event));
        self
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn with_child(mut self, child: NodeDef) -> Self {
        self.children.push(child);
        self
    }

    #[inline]
    pub fn is_task(&self) -> bool {
        self.kind == NodeKind::Task
    }

    pub fn child(&self, name: &str) -> Option<&NodeDef> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// A validated suite: one tree, instantiated once per cycle by the graph.
#[derive(Debug, Clone)]
pub struct SuiteDef {
    root: NodeDef,
}

impl SuiteDef {
    /// Build a suite whose top level holds `children`.
    pub fn new(children: Vec<NodeDef>) -> Result<Self> {
        let mut root = NodeDef::family("");
        root.children = children;
        Self::from_root(root)
    }

    /// Build a suite from an explicit root family, which may carry
    /// suite-wide trigger, complete and time conditions.
    pub fn from_root(root: NodeDef) -> Result<Self> {
        if root.is_task() {
            return Err(Error::TaskWithChildren("<suite>".to_owned()).into());
        }
        validate_children(&root, &Path::root(Default::default()))
            .context("Invalid suite definition")?;
        log::debug!("Validated suite with {} top-level nodes", root.children.len());
        Ok(Self { root })
    }

    pub fn root(&self) -> &NodeDef {
        &self.root
    }

    /// Definition at `names` below the root.
    pub fn get<S: AsRef<str>>(&self, names: &[S]) -> Option<&NodeDef> {
        let mut node = &self.root;
        for name in names {
            node = node.child(name.as_ref())?;
        }
        Some(node)
    }
}

fn validate_children(node: &NodeDef, path: &Path) -> Result<(), Error> {
    let mut seen = util::hash_set(node.children.len());
    for child in &node.children {
        if child.name.is_empty() || child.name.contains('.') {
            return Err(Error::InvalidName(child.name.clone()));
        }
        if !seen.insert(child.name.as_str()) {
            return Err(Error::DuplicateName {
                family: path.to_string(),
                name: child.name.clone(),
            });
        }
        let child_path = path.child(&child.name);
        match child.kind {
            NodeKind::Task if !child.children.is_empty() => {
                return Err(Error::TaskWithChildren(child_path.to_string()));
            }
            NodeKind::Family if !child.events.is_empty() => {
                return Err(Error::EventOnFamily(child_path.to_string()));
            }
            _ => (),
        }
        validate_children(child, &child_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn suite() -> Result<SuiteDef> {
        SuiteDef::new(vec![
            NodeDef::family("prep")
                .with_child(NodeDef::task("fetch").with_event("got_obs"))
                .with_child(NodeDef::task("clean")),
            NodeDef::task("final"),
        ])
    }

    #[test]
    fn test_get() -> Result<()> {
        let suite = suite()?;
        assert_eq!(suite.get(&["prep", "fetch"]).map(|n| n.kind), Some(NodeKind::Task));
        assert_eq!(suite.get::<&str>(&[]).map(|n| n.kind), Some(NodeKind::Family));
        assert!(suite.get(&["prep", "missing"]).is_none());
        Ok(())
    }

    #[test]
    fn test_duplicate_names() {
        let err = SuiteDef::new(vec![
            NodeDef::family("fam")
                .with_child(NodeDef::task("a"))
                .with_child(NodeDef::task("a")),
        ])
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::DuplicateName {
                family: "fam".to_owned(),
                name: "a".to_owned()
            })
        );
    }

    #[test]
    fn test_structure_errors() {
        let task_with_child = NodeDef::task("t").with_child(NodeDef::task("u"));
        let err = SuiteDef::new(vec![task_with_child]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::TaskWithChildren("t".to_owned()))
        );

        let family_event = NodeDef::family("f").with_event("go");
        assert!(SuiteDef::new(vec![family_event]).is_err());

        let dotted = NodeDef::task("a.b");
        assert!(SuiteDef::new(vec![dotted]).is_err());
    }
}
