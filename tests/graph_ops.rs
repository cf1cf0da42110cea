use std::collections::BTreeSet;
use std::sync::Arc;

use cellgraph::{
    CellGraph, Direction, ElementKind, GraphConfig, GraphError, MemoryStore, PropertyValue,
};

fn open_graph(config: GraphConfig) -> CellGraph {
    CellGraph::open(Arc::new(MemoryStore::new()), config).unwrap()
}

fn default_graph() -> CellGraph {
    open_graph(GraphConfig::default())
}

#[test]
fn vertex_lifecycle() {
    let g = default_graph();
    assert!(g.is_empty().unwrap());
    let v = g.add_vertex(Some("A")).unwrap();
    assert_eq!(v.id(), "A");
    assert!(!g.is_empty().unwrap());
    assert!(g.vertex("A").unwrap().is_some());
    assert!(g.vertex("missing").unwrap().is_none());
    g.remove_vertex("A").unwrap();
    assert!(g.vertex("A").unwrap().is_none());
}

#[test]
fn duplicate_vertex_is_rejected_unless_checks_are_skipped() {
    let g = default_graph();
    g.add_vertex(Some("1")).unwrap();
    assert!(matches!(
        g.add_vertex(Some("1")),
        Err(GraphError::DuplicateId(_))
    ));

    let g = open_graph(GraphConfig {
        skip_existence_checks: true,
        ..GraphConfig::default()
    });
    g.add_vertex(Some("1")).unwrap();
    g.add_vertex(Some("1")).unwrap();
    assert!(g.vertex("1").unwrap().is_some());
}

#[test]
fn traversal_over_one_edge() {
    let g = default_graph();
    g.add_vertex(Some("A")).unwrap();
    g.add_vertex(Some("B")).unwrap();
    g.add_edge(Some("e1"), "A", "B", "knows").unwrap();

    let edges: Vec<_> = g
        .incident_edges("A", Direction::Out, &["knows"])
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(edges.len(), 1);
    let edge = &edges[0];
    assert_eq!(edge.id(), "e1");
    assert_eq!(edge.label(), Some("knows"));
    assert_eq!(edge.out_vertex(), Some("A"));
    assert_eq!(edge.in_vertex(), Some("B"));

    assert!(g
        .incident_edges("A", Direction::Out, &["likes"])
        .unwrap()
        .next()
        .is_none());
    assert_eq!(
        g.incident_edges("A", Direction::In, &[])
            .unwrap()
            .count(),
        0
    );
}

#[test]
fn adjacency_is_symmetric() {
    let g = default_graph();
    for id in ["A", "B", "C"] {
        g.add_vertex(Some(id)).unwrap();
    }
    g.add_edge(Some("e1"), "A", "B", "knows").unwrap();
    g.add_edge(Some("e2"), "C", "A", "likes").unwrap();

    let out_of_a: Vec<_> = g
        .adjacent_vertices("A", Direction::Out, &["knows"])
        .unwrap()
        .map(|v| v.unwrap().id().to_string())
        .collect();
    assert_eq!(out_of_a, vec!["B"]);

    let into_b: Vec<_> = g
        .adjacent_vertices("B", Direction::In, &["knows"])
        .unwrap()
        .map(|v| v.unwrap().id().to_string())
        .collect();
    assert_eq!(into_b, vec!["A"]);

    let both_of_a: BTreeSet<_> = g
        .adjacent_vertices("A", Direction::Both, &[])
        .unwrap()
        .map(|v| v.unwrap().id().to_string())
        .collect();
    assert_eq!(
        both_of_a,
        BTreeSet::from(["B".to_string(), "C".to_string()])
    );
}

#[test]
fn property_round_trip_with_clean_and_warm_cache() {
    let g = default_graph();
    let v = g.add_vertex(Some("A")).unwrap();
    let values = [
        PropertyValue::Bool(true),
        PropertyValue::Int(-7),
        PropertyValue::Float(2.5),
        PropertyValue::String("tove".into()),
        PropertyValue::Bytes(vec![0, 1, 254]),
    ];
    for (i, value) in values.iter().enumerate() {
        let key = format!("k{i}");
        g.set_property(ElementKind::Vertex, v.id(), &key, value)
            .unwrap();
        g.flush().unwrap();
        assert_eq!(
            g.property(ElementKind::Vertex, v.id(), &key).unwrap(),
            Some(value.clone()),
            "warm cache read of {key}"
        );
        g.clear_cache();
        assert_eq!(
            g.property(ElementKind::Vertex, v.id(), &key).unwrap(),
            Some(value.clone()),
            "clean cache read of {key}"
        );
    }
}

#[test]
fn edge_properties_and_keys() {
    let g = default_graph();
    g.add_vertex(Some("A")).unwrap();
    g.add_vertex(Some("B")).unwrap();
    let e = g.add_edge(Some("e"), "A", "B", "knows").unwrap();
    g.set_property(
        ElementKind::Edge,
        e.id(),
        "since",
        &PropertyValue::Int(2014),
    )
    .unwrap();
    assert_eq!(
        g.property(ElementKind::Edge, e.id(), "since").unwrap(),
        Some(PropertyValue::Int(2014))
    );
    assert_eq!(
        g.property(ElementKind::Edge, e.id(), "label").unwrap(),
        Some(PropertyValue::String("knows".into()))
    );
    let keys = g.property_keys(ElementKind::Edge, e.id()).unwrap();
    assert_eq!(keys, BTreeSet::from(["since".to_string()]));

    let removed = g.remove_property(ElementKind::Edge, e.id(), "since").unwrap();
    assert_eq!(removed, Some(PropertyValue::Int(2014)));
    assert_eq!(
        g.property(ElementKind::Edge, e.id(), "since").unwrap(),
        None
    );
    assert!(g
        .property_keys(ElementKind::Edge, e.id())
        .unwrap()
        .is_empty());
}

#[test]
fn vertex_property_keys_exclude_schema_families() {
    let g = default_graph();
    g.add_vertex(Some("A")).unwrap();
    g.add_vertex(Some("B")).unwrap();
    g.add_edge(Some("e"), "A", "B", "knows").unwrap();
    g.set_property(
        ElementKind::Vertex,
        "A",
        "name",
        &PropertyValue::String("a".into()),
    )
    .unwrap();
    let keys = g.property_keys(ElementKind::Vertex, "A").unwrap();
    assert_eq!(keys, BTreeSet::from(["name".to_string()]));
}

#[test]
fn removing_a_vertex_cascades_to_incident_edges() {
    let g = default_graph();
    for id in ["A", "B", "C"] {
        g.add_vertex(Some(id)).unwrap();
    }
    g.add_edge(Some("e"), "A", "B", "l").unwrap();
    g.add_edge(Some("f"), "C", "A", "l").unwrap();

    g.remove_vertex("A").unwrap();

    assert!(g.edge("e").unwrap().is_none());
    assert!(g.edge("f").unwrap().is_none());
    assert_eq!(g.incident_edges("B", Direction::In, &[]).unwrap().count(), 0);
    assert_eq!(
        g.incident_edges("C", Direction::Out, &[]).unwrap().count(),
        0
    );
    assert_eq!(g.edges().unwrap().count(), 0);
}

#[test]
fn removing_an_edge_clears_both_adjacency_cells() {
    let g = default_graph();
    g.add_vertex(Some("A")).unwrap();
    g.add_vertex(Some("B")).unwrap();
    g.add_edge(Some("e"), "A", "B", "l").unwrap();
    g.set_property(ElementKind::Edge, "e", "w", &PropertyValue::Int(1))
        .unwrap();

    g.remove_edge("e").unwrap();

    assert!(g.edge("e").unwrap().is_none());
    assert_eq!(g.incident_edges("A", Direction::Out, &[]).unwrap().count(), 0);
    assert_eq!(g.incident_edges("B", Direction::In, &[]).unwrap().count(), 0);
    assert!(g.vertex("A").unwrap().is_some());
    assert!(g.vertex("B").unwrap().is_some());
}

#[test]
fn edge_lookup_resolves_endpoints_and_label() {
    let g = default_graph();
    g.add_vertex(Some("A")).unwrap();
    g.add_vertex(Some("B")).unwrap();
    g.add_edge(Some("e"), "A", "B", "knows").unwrap();
    g.clear_cache();

    let edge = g.edge("e").unwrap().unwrap();
    assert_eq!(edge.label(), Some("knows"));
    assert_eq!(edge.in_vertex(), Some("B"));
    assert_eq!(edge.out_vertex(), Some("A"));

    let in_v = g.edge_vertex("e", Direction::In).unwrap().unwrap();
    assert_eq!(in_v.id(), "B");
    let out_v = g.edge_vertex("e", Direction::Out).unwrap().unwrap();
    assert_eq!(out_v.id(), "A");
    assert!(g.edge_vertex("ghost", Direction::In).unwrap().is_none());
}

#[test]
fn full_scans_reconstruct_all_elements() {
    let g = default_graph();
    for id in ["a", "b", "c"] {
        g.add_vertex(Some(id)).unwrap();
    }
    g.add_edge(Some("e1"), "a", "b", "x").unwrap();
    g.add_edge(Some("e2"), "b", "c", "y").unwrap();

    let vertex_ids: BTreeSet<_> = g
        .vertices()
        .unwrap()
        .map(|v| v.unwrap().id().to_string())
        .collect();
    assert_eq!(
        vertex_ids,
        BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string()])
    );

    let mut edge_labels = BTreeSet::new();
    for edge in g.edges().unwrap() {
        let edge = edge.unwrap();
        edge_labels.insert(edge.label().unwrap().to_string());
    }
    assert_eq!(edge_labels, BTreeSet::from(["x".to_string(), "y".to_string()]));
}

#[test]
fn preloaded_properties_arrive_with_the_vertex() {
    let g = open_graph(GraphConfig {
        preloaded_properties: vec!["name".to_string()],
        ..GraphConfig::default()
    });
    g.add_vertex(Some("A")).unwrap();
    g.set_property(
        ElementKind::Vertex,
        "A",
        "name",
        &PropertyValue::String("alice".into()),
    )
    .unwrap();
    g.set_property(ElementKind::Vertex, "A", "age", &PropertyValue::Int(9))
        .unwrap();
    g.clear_cache();

    let v = g.vertex("A").unwrap().unwrap();
    assert_eq!(
        v.property("name"),
        Some(&PropertyValue::String("alice".into()))
    );
    // Not preloaded, so absent from the handle but readable through the graph.
    assert_eq!(v.property("age"), None);
    assert_eq!(
        g.property(ElementKind::Vertex, "A", "age").unwrap(),
        Some(PropertyValue::Int(9))
    );
}

#[test]
fn self_loops_survive_removal() {
    let g = default_graph();
    g.add_vertex(Some("A")).unwrap();
    g.add_edge(Some("e"), "A", "A", "loops").unwrap();
    let edges: Vec<_> = g
        .incident_edges("A", Direction::Both, &[])
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(edges.len(), 2);
    g.remove_vertex("A").unwrap();
    assert!(g.edge("e").unwrap().is_none());
    assert!(g.vertex("A").unwrap().is_none());
}

#[test]
fn clear_resets_the_graph_and_reopens_writers() {
    let g = default_graph();
    g.add_vertex(Some("A")).unwrap();
    assert!(!g.is_empty().unwrap());
    g.clear().unwrap();
    assert!(g.is_empty().unwrap());
    g.add_vertex(Some("A")).unwrap();
    assert!(g.vertex("A").unwrap().is_some());
}

#[test]
fn shutdown_closes_the_writers() {
    let g = default_graph();
    g.add_vertex(Some("A")).unwrap();
    g.shutdown().unwrap();
    assert!(g.add_vertex(Some("B")).is_err());
    // Reads still work; the vertex written before shutdown persisted.
    assert!(g.vertex("A").unwrap().is_some());
}

#[test]
fn buffered_writes_become_visible_on_flush() {
    let g = open_graph(GraphConfig {
        auto_flush: false,
        lru_max_capacity: 0,
        ..GraphConfig::default()
    });
    g.add_vertex(Some("A")).unwrap();
    assert!(g.vertex("A").unwrap().is_none());
    g.flush().unwrap();
    assert!(g.vertex("A").unwrap().is_some());
}
