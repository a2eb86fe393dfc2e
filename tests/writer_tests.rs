#![allow(clippy::panic_in_result_fn)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use std::collections::BTreeSet;

use tidyxml::{
    compact, config::DEFAULT_MAX_DEPTH, parse_file, parse_str, to_string, to_writer, write_file,
    Attribute, Node, ParserConfig, Serializer, WorkerPool, WriterConfig,
};

fn waypoints(count: usize) -> Node {
    let mut gpx = Node::new("gpx").with_attribute("version", "1.0");
    for i in 0..count {
        gpx.children.push(
            Node::new("wpt")
                .with_attribute("id", i.to_string())
                .with_child(Node::new("name").with_body(format!("W{i}")))
                .with_child(Node::new("empty")),
        );
    }
    Node::root().with_child(gpx)
}

#[test]
fn test_round_trip_single_worker() {
    let input = r#"<gpx version="1.0"><wpt lat="1" lon="2"><name>A &amp; B</name></wpt><trk><seg><pt x="1"/><pt x="2"/></seg></trk></gpx>"#;
    let mut root = parse_str(input).unwrap();
    let pool = WorkerPool::new(1).unwrap();
    let text = to_string(&mut root, &pool).unwrap();

    assert_eq!(parse_str(&text).unwrap(), root);
}

#[test]
fn test_round_trip_keeps_child_order_with_one_worker() {
    let mut root = waypoints(1_000);
    let pool = WorkerPool::new(1).unwrap();
    let text = to_string(&mut root, &pool).unwrap();

    let reparsed = parse_str(&text).unwrap();
    assert_eq!(reparsed, root);
    let ids: Vec<_> = reparsed.children[0]
        .children
        .iter()
        .map(|w| w.attribute("id").unwrap().parse::<usize>().unwrap())
        .collect();
    assert_eq!(ids, (0..1_000).collect::<Vec<_>>());
}

#[test]
fn test_wide_tree_content_survives_parallel_write() {
    let mut root = waypoints(10_000);
    let pool = WorkerPool::new(8).unwrap();
    let text = to_string(&mut root, &pool).unwrap();

    assert!(!text.contains("<empty"));
    let reparsed = parse_str(&text).unwrap();
    let gpx = &reparsed.children[0];
    assert_eq!(gpx.name, "gpx");
    assert_eq!(gpx.children.len(), 10_000);

    let ids: BTreeSet<usize> = gpx
        .children
        .iter()
        .map(|w| w.attribute("id").unwrap().parse().unwrap())
        .collect();
    assert_eq!(ids, (0..10_000).collect());
    assert!(gpx.children.iter().all(|w| {
        let id = w.attribute("id").unwrap();
        w.child("name").unwrap().body.as_deref() == Some(format!("W{id}").as_str())
    }));
}

#[test]
fn test_entities_survive_round_trip() {
    let value = "quote \" apostrophe ' lt < gt > amp &";
    let mut root = Node::root().with_child(
        Node::new("a")
            .with_attribute("v", value)
            .with_body(value),
    );
    let pool = WorkerPool::new(2).unwrap();
    let text = to_string(&mut root, &pool).unwrap();

    assert!(text.contains("&quot;"));
    assert!(text.contains("&apos;"));
    let reparsed = parse_str(&text).unwrap();
    assert_eq!(reparsed.children[0].attribute("v"), Some(value));
    assert_eq!(reparsed.children[0].body.as_deref(), Some(value));
}

#[test]
fn test_unset_attribute_is_kept_but_not_written() {
    let mut flag = Node::new("flag");
    flag.attributes.push(Attribute::unset("hidden"));
    let mut root = Node::root().with_child(Node::new("doc").with_child(flag));
    let pool = WorkerPool::new(1).unwrap();
    let text = to_string(&mut root, &pool).unwrap();

    assert!(text.contains("  <flag />\n"));
    assert!(!text.contains("hidden"));
}

#[test]
fn test_to_writer_returns_writer() {
    let mut root = waypoints(3);
    let pool = WorkerPool::new(2).unwrap();
    let bytes = to_writer(&mut root, &pool, Vec::new()).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.matches("<wpt ").count(), 3);
}

#[test]
fn test_custom_writer_config() {
    let root = Node::root().with_child(Node::new("a").with_child(Node::new("b").with_body("x")));
    let pool = WorkerPool::new(1).unwrap();
    let config = WriterConfig {
        indent_width: 4,
        declaration: "<?xml version=\"1.0\"?>".to_string(),
        ..WriterConfig::default()
    };
    let text = Serializer::new(&pool).with_config(config).to_string(&root).unwrap();
    assert_eq!(text, "<?xml version=\"1.0\"?>\n<a>\n    <b>x</b>\n</a>\n");
}

#[test]
fn test_low_thresholds_fan_out_nested_levels() {
    let mut root = waypoints(50);
    let pool = WorkerPool::new(4).unwrap();
    compact(&mut root, &pool).unwrap();
    let config = WriterConfig {
        serialize_fan_out: 1,
        flush_every: 3,
        ..WriterConfig::default()
    };
    let text = Serializer::new(&pool).with_config(config).to_string(&root).unwrap();
    let reparsed = parse_str(&text).unwrap();
    assert_eq!(reparsed.children[0].children.len(), 50);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xml");
    let mut root = waypoints(300);
    let pool = WorkerPool::new(1).unwrap();
    compact(&mut root, &pool).unwrap();

    write_file(&path, &root, &pool, WriterConfig::default()).unwrap();
    let reparsed = parse_file(&path, ParserConfig::default()).unwrap();
    assert_eq!(reparsed, root);
}

#[test]
fn test_deepest_parsable_subtree_on_workers() {
    // wide node plus its children take two levels
    let mut chain = Node::new("n").with_body("leaf");
    for _ in 0..DEFAULT_MAX_DEPTH - 2 {
        chain = Node::new("n").with_child(chain);
    }
    let mut wide = Node::new("wide");
    wide.children.push(chain.clone());
    for i in 0..300 {
        wide.children
            .push(Node::new("item").with_attribute("id", i.to_string()));
    }
    let mut root = Node::root().with_child(wide);

    let pool = WorkerPool::new(2).unwrap();
    let text = to_string(&mut root, &pool).unwrap();
    let reparsed = parse_str(&text).unwrap();

    let wide = &reparsed.children[0];
    assert_eq!(wide.children.len(), 301);
    assert_eq!(wide.child("n"), Some(&chain));
    assert_eq!(reparsed.count(), root.count());
}
