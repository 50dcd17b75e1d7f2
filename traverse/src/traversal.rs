use anyhow::Result;
use chrono::NaiveDateTime;

use crate::{Graph, Node, NodeId};

/// Callbacks for [`Graph::depth_first_traversal`].
pub trait Visitor {
    /// Prune `node` and everything below it.
    /// By default, nodes that can never run are pruned.
    fn skip(&mut self, _graph: &Graph, node: &Node) -> bool {
        !node.might_complete()
    }

    /// Called before any of `node`'s descendants.
    fn enter(&mut self, graph: &Graph, id: NodeId, node: &Node) -> Result<()>;

    /// Called after all of `node`'s descendants.
    fn exit(&mut self, _graph: &Graph, _id: NodeId, _node: &Node) -> Result<()> {
        Ok(())
    }
}

impl Graph {
    /// Walk the tree of `cycle` from its root, calling `enter` in pre-order
    /// and `exit` in post-order for every node that isn't skipped.
    pub fn depth_first_traversal<V: Visitor>(&self, cycle: NaiveDateTime, visitor: &mut V) -> Result<()> {
        let root = self.root(cycle)?;
        self.visit(root, visitor)
    }

    fn visit<V: Visitor>(&self, id: NodeId, visitor: &mut V) -> Result<()> {
        let node = self.node(id);
        if visitor.skip(self, node) {
            log::trace!("skipping {}", node.path);
            return Ok(());
        }
        visitor.enter(self, id, node)?;
        for &child in &node.children {
            self.visit(child, visitor)?;
        }
        visitor.exit(self, id, node)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use workflow::{Clock, CycleOffset, Dependency, NodeDef, Path, SuiteDef};

    /// Records "+name" on enter and "-name" on exit.
    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Visitor for Recorder {
        fn enter(&mut self, _: &Graph, _: NodeId, node: &Node) -> Result<()> {
            self.0.push(format!("+{}", node.path.name().unwrap_or("")));
            Ok(())
        }

        fn exit(&mut self, _: &Graph, _: NodeId, node: &Node) -> Result<()> {
            self.0.push(format!("-{}", node.path.name().unwrap_or("")));
            Ok(())
        }
    }

    fn graph(suite: &SuiteDef) -> Result<(Graph, NaiveDateTime)> {
        let cycle = NaiveDate::from_ymd_opt(2017, 8, 15)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let clock = Clock::new(cycle, cycle + Duration::hours(6), Duration::hours(6))?;
        let mut graph = Graph::new(clock);
        graph.add_cycle(suite, cycle)?;
        graph.simplify_cycle(cycle)?;
        Ok((graph, cycle))
    }

    #[test]
    fn test_balanced_order() -> Result<()> {
        let suite = SuiteDef::new(vec![
            NodeDef::family("f")
                .with_child(NodeDef::task("a"))
                .with_child(NodeDef::family("g").with_child(NodeDef::task("b"))),
            NodeDef::task("c"),
        ])?;
        let (graph, cycle) = graph(&suite)?;
        let mut recorder = Recorder::default();
        graph.depth_first_traversal(cycle, &mut recorder)?;
        assert_eq!(
            recorder.0,
            vec!["+", "+f", "+a", "-a", "+g", "+b", "-b", "-g", "-f", "+c", "-c", "-"]
        );
        Ok(())
    }

    #[test]
    fn test_unreachable_pruned() -> Result<()> {
        // g can never run, so b is never visited even though its own trigger is fine.
        let never = Dependency::cycle_exists(CycleOffset::hours(-6));
        let suite = SuiteDef::new(vec![
            NodeDef::family("f")
                .with_child(NodeDef::task("a"))
                .with_child(
                    NodeDef::family("g")
                        .with_trigger(never)
                        .with_child(NodeDef::task("b")),
                ),
        ])?;
        let (graph, cycle) = graph(&suite)?;
        let b = graph.get(&Path::dotted("f.g.b")).unwrap();
        assert!(!graph.node(b).might_complete());

        let mut recorder = Recorder::default();
        graph.depth_first_traversal(cycle, &mut recorder)?;
        assert_eq!(recorder.0, vec!["+", "+f", "+a", "-a", "-f", "-"]);
        Ok(())
    }
}
