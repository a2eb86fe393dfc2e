//! Property-based tests for reading and writing
//!
//! These tests use proptest to verify:
//! 1. Roundtrip property: compact -> serialize -> parse == compacted tree
//! 2. Compaction is idempotent and leaves no vestigial element behind
//! 3. Parallel serialization writes every child exactly once
//! 4. Arbitrary input never panics the parser

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use proptest::prelude::*;
use tidyxml::{compact, escape, parse_str, to_string, unescape, Attribute, Node, WorkerPool};

fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,5}"
}

fn attributes() -> impl Strategy<Value = Vec<Attribute>> {
    prop::collection::vec(
        (name(), "[a-zA-Z0-9 &<>\"'.,;:=/-]{0,12}").prop_map(|(n, v)| Attribute::new(n, v)),
        0..3,
    )
}

/// Bodies come back trimmed, so generated ones never start or end blank.
fn body() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-zA-Z0-9&<>\"'.;]([a-zA-Z0-9 &<>\"'.;]{0,10}[a-zA-Z0-9&<>\"'.;])?")
}

fn node() -> impl Strategy<Value = Node> {
    let leaf = (name(), attributes(), body()).prop_map(|(name, attributes, body)| Node {
        name,
        attributes,
        children: Vec::new(),
        body,
    });
    leaf.prop_recursive(4, 64, 8, |inner| {
        (
            name(),
            attributes(),
            body(),
            prop::collection::vec(inner, 0..8),
        )
            .prop_map(|(name, attributes, body, children)| Node {
                name,
                attributes,
                children,
                body,
            })
    })
}

fn document() -> impl Strategy<Value = Node> {
    prop::collection::vec(node(), 0..3).prop_map(|children| Node {
        children,
        ..Node::root()
    })
}

fn has_vestigial(node: &Node) -> bool {
    node.children
        .iter()
        .any(|child| child.is_vestigial() || has_vestigial(child))
}

proptest! {
    #[test]
    fn test_round_trip(mut root in document()) {
        let pool = WorkerPool::new(1).unwrap();
        let text = to_string(&mut root, &pool).unwrap();
        let reparsed = parse_str(&text).unwrap();
        prop_assert_eq!(reparsed, root);
    }

    #[test]
    fn test_compaction_is_idempotent(mut root in document()) {
        let pool = WorkerPool::new(3).unwrap();
        compact(&mut root, &pool).unwrap();
        prop_assert!(!has_vestigial(&root));

        let once = root.clone();
        compact(&mut root, &pool).unwrap();
        prop_assert_eq!(root, once);
    }

    #[test]
    fn test_escape_unescape(input in any::<String>()) {
        let input = input.replace(['\0', '\u{FFFE}', '\u{FFFF}'], "");
        let escaped = escape(&input);
        prop_assert!(!escaped.contains(['<', '>', '"', '\'']));
        prop_assert_eq!(unescape(&escaped), input.as_str());
    }

    #[test]
    fn test_parser_never_panics(input in "\\PC{0,200}") {
        let _ = parse_str(&input);
    }

    #[test]
    fn test_parser_never_panics_on_markup(input in "[<>/=\"' a-c?!]{0,64}") {
        let _ = parse_str(&input);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_parallel_write_keeps_every_child(children in prop::collection::vec(node(), 201..400)) {
        let mut root = Node::root().with_child(Node::new("wide").with_attribute("k", "v"));
        root.children[0].children = children;

        let pool = WorkerPool::new(4).unwrap();
        let text = to_string(&mut root, &pool).unwrap();
        let reparsed = parse_str(&text).unwrap();

        let rendered = |node: &Node| node.children.iter().map(Node::to_string).collect::<Vec<_>>();
        let mut expected = rendered(&root.children[0]);
        let mut written = rendered(&reparsed.children[0]);
        expected.sort();
        written.sort();
        prop_assert_eq!(written, expected);
    }
}
