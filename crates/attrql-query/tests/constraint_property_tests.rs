use attrql_query::{AttributeEdge, Connection, ConstraintLeaf, ConstraintNode, ConstraintTree};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add { leaf: usize, connection: Connection },
    Combine { leaves: Vec<usize>, connection: Connection },
}

fn connection() -> impl Strategy<Value = Connection> {
    prop_oneof![Just(Connection::And), Just(Connection::Or)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6, connection()).prop_map(|(leaf, connection)| Op::Add { leaf, connection }),
        (prop::collection::vec(0usize..6, 1..4), connection())
            .prop_map(|(leaves, connection)| Op::Combine { leaves, connection }),
    ]
}

fn leaf(i: usize) -> ConstraintLeaf {
    ConstraintLeaf::new(AttributeEdge::direct(format!("http://x/a{i}")), format!("v{i}"))
}

fn build(ops: &[Op]) -> (ConstraintTree, usize) {
    let mut tree = ConstraintTree::new();
    let mut leaves = 0;
    for op in ops {
        match op {
            Op::Add { leaf: i, connection } => {
                tree.add(leaf(*i), *connection);
                leaves += 1;
            }
            Op::Combine {
                leaves: items,
                connection,
            } => {
                let mut other = ConstraintTree::new();
                other.extend(items.iter().map(|i| leaf(*i)));
                leaves += items.len();
                tree = match connection {
                    Connection::And => tree & other,
                    Connection::Or => tree | other,
                };
            }
        }
    }
    (tree, leaves)
}

fn count_leaves(tree: &ConstraintTree) -> usize {
    tree.children()
        .iter()
        .map(|child| match child {
            ConstraintNode::Leaf(_) => 1,
            ConstraintNode::Composite(inner) => count_leaves(inner),
        })
        .sum()
}

/// Connection words seen at each parenthesis frame of a rendering.
fn frames(rendered: &str) -> Vec<Vec<&'static str>> {
    let mut stack: Vec<Vec<&'static str>> = vec![Vec::new()];
    let mut done = Vec::new();
    let bytes = rendered.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if rendered[i..].starts_with(" AND ") {
            if let Some(top) = stack.last_mut() {
                top.push("AND");
            }
            i += 5;
            continue;
        }
        if rendered[i..].starts_with(" OR ") {
            if let Some(top) = stack.last_mut() {
                top.push("OR");
            }
            i += 4;
            continue;
        }
        match bytes[i] {
            b'(' => stack.push(Vec::new()),
            b')' => {
                if let Some(frame) = stack.pop() {
                    done.push(frame);
                }
            }
            _ => {}
        }
        i += 1;
    }
    done.extend(stack);
    done
}

proptest! {
    #[test]
    fn rendering_never_mixes_connections_in_one_level(ops in prop::collection::vec(op(), 1..12)) {
        let (tree, _) = build(&ops);
        let rendered = tree.to_string();
        for frame in frames(&rendered) {
            if let Some(first) = frame.first() {
                prop_assert!(frame.iter().all(|c| c == first), "mixed level in {rendered}");
            }
        }
    }

    #[test]
    fn combining_keeps_every_leaf(ops in prop::collection::vec(op(), 1..12)) {
        let (tree, leaves) = build(&ops);
        prop_assert_eq!(count_leaves(&tree), leaves);
    }

    #[test]
    fn every_composite_has_a_connection(ops in prop::collection::vec(op(), 1..12)) {
        fn check(tree: &ConstraintTree) -> bool {
            (tree.is_empty() || tree.connection().is_some())
                && tree.children().iter().all(|child| match child {
                    ConstraintNode::Leaf(_) => true,
                    ConstraintNode::Composite(inner) => check(inner),
                })
        }
        let (tree, _) = build(&ops);
        prop_assert!(check(&tree));
    }
}
