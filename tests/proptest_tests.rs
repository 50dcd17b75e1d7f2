//! Property tests over randomly shaped suites.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use suitegraph::{Clock, Generator, NodeDef, NodeKind, Settings, SuiteDef, Visit};

/// Shape of a suite: for node k, the index of its parent among the families
/// created so far (0 is the root), and whether node k is itself a family.
fn shape() -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((0usize..64, any::<bool>()), 1..16)
}

fn build(shape: &[(usize, bool)]) -> (SuiteDef, usize) {
    // (name, is_family, children) with index 0 the root.
    let mut nodes: Vec<(String, bool, Vec<usize>)> = vec![(String::new(), true, Vec::new())];
    let mut families = vec![0];
    for (k, &(pick, is_family)) in shape.iter().enumerate() {
        let parent = families[pick % families.len()];
        let id = nodes.len();
        nodes.push((format!("n{k}"), is_family, Vec::new()));
        nodes[parent].2.push(id);
        if is_family {
            families.push(id);
        }
    }

    fn to_def(nodes: &[(String, bool, Vec<usize>)], id: usize) -> NodeDef {
        let (name, is_family, children) = &nodes[id];
        let mut def = if *is_family {
            NodeDef::family(name)
        } else {
            NodeDef::task(name)
        };
        for &child in children {
            def = def.with_child(to_def(nodes, child));
        }
        def
    }
    let children = nodes[0].2.iter().map(|&c| to_def(&nodes, c)).collect();
    (SuiteDef::new(children).unwrap(), nodes.len())
}

fn settings() -> Settings {
    let start = NaiveDate::from_ymd_opt(2017, 8, 15)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    Settings::new(Clock::new(start, start + Duration::hours(12), Duration::hours(6)).unwrap())
}

proptest! {
    #[test]
    fn every_node_visited_once_in_nested_order(shape in shape()) {
        let (suite, count) = build(&shape);
        let plans = Generator::new(settings(), suite).generate().unwrap();
        prop_assert_eq!(plans.len(), 3);

        for plan in &plans {
            let mut depth = 0usize;
            let mut entered = 0usize;
            for visit in &plan.visits {
                match visit {
                    Visit::Enter(node) => {
                        prop_assert_eq!(node.path.depth(), depth);
                        prop_assert!(node.kind == NodeKind::Family || node.path.depth() > 0);
                        depth += 1;
                        entered += 1;
                    }
                    Visit::Exit(path) => {
                        depth -= 1;
                        prop_assert_eq!(path.depth(), depth);
                    }
                }
            }
            prop_assert_eq!(depth, 0);
            prop_assert_eq!(entered, count);
        }
    }
}
