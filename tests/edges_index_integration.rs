//! Integration tests for the `edges.v1` index artifact
//!
//! The JSON field names are consumed by other tools, so these tests check
//! the serialized shape directly rather than round-tripping through our own
//! types only.

mod common;

use common::builders::{sample_index, EdgeBuilder};
use edgeflow::edge::{EdgeError, EdgeKind, EdgesIndex, EDGES_SCHEMA};
use serde_json::Value;

#[test]
fn test_saved_index_is_sorted_and_tagged() {
    let dir = tempfile::tempdir().unwrap();
    let path = EdgesIndex::default_path(dir.path(), "demo");
    assert!(path.ends_with("build/debug/asm/demo/edges.json"));

    let mut index = sample_index("demo");
    index.save(&path).unwrap();

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["schema"], EDGES_SCHEMA);
    assert_eq!(json["package"], "demo");

    let labels: Vec<_> = json["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["label"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Downstream.step1.in",
            "Ingest.step1.in",
            "Ingest.step2.in",
            "Stack.step1.in",
        ]
    );
}

#[test]
fn test_descriptor_field_names_and_derived_values() {
    let edge = EdgeBuilder::new("Ingest", 2)
        .capacity(1, 8)
        .backpressure("dropOldest")
        .build();
    let json = serde_json::to_value(&edge).unwrap();

    assert_eq!(json["kind"], "edge.FIFO");
    assert_eq!(json["minCapacity"], 1);
    assert_eq!(json["maxCapacity"], 8);
    assert_eq!(json["backpressure"], "dropOldest");
    assert_eq!(json["type"], "[]byte");
    assert_eq!(json["segment"], "normal");
    assert_eq!(json["bounded"], true);
    assert_eq!(json["delivery"], "bestEffort");

    let unbounded = serde_json::to_value(EdgeBuilder::new("Free", 1).build()).unwrap();
    assert_eq!(unbounded["bounded"], false);
    assert_eq!(unbounded["delivery"], "atLeastOnce");
}

#[test]
fn test_stale_derived_fields_are_recomputed() {
    let raw = r#"{
        "schema": "edges.v1",
        "package": "demo",
        "edges": [{
            "unit": "u", "pipeline": "P", "segment": "error", "step": 1,
            "node": "n", "label": "P.step1.in", "kind": "edge.LIFO",
            "minCapacity": 0, "maxCapacity": 0, "backpressure": "block",
            "type": "int", "bounded": true, "delivery": "bestEffort"
        }]
    }"#;
    let index = EdgesIndex::from_json(raw).unwrap();
    let edge = index.find("P.step1.in").unwrap();
    assert_eq!(edge.kind, EdgeKind::Lifo);

    let json = serde_json::to_value(edge).unwrap();
    assert_eq!(json["bounded"], false);
    assert_eq!(json["delivery"], "atLeastOnce");
}

#[test]
fn test_unknown_policy_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edges.json");

    let mut index = EdgesIndex::new("demo");
    index.push(EdgeBuilder::new("Odd", 1).capacity(0, 2).backpressure("spill").build());
    index.save(&path).unwrap();

    let loaded = EdgesIndex::load(&path).unwrap();
    let edge = loaded.find("Odd.step1.in").unwrap();
    assert_eq!(edge.backpressure.as_str(), "spill");
    assert!(!edge.backpressure.is_recognized());
    assert!(matches!(
        loaded.validate(),
        Err(EdgeError::Validation { code: "E_EDGE_BP_INVALID", .. })
    ));
}

#[test]
fn test_wrong_schema_rejected() {
    let err = EdgesIndex::from_json(r#"{"schema":"edges.v0","package":"x","edges":[]}"#).unwrap_err();
    assert!(matches!(err, EdgeError::Schema { .. }));
}

#[test]
fn test_pipeline_edge_requires_upstream() {
    let mut index = EdgesIndex::new("demo");
    index.push(EdgeBuilder::new("Down", 1).kind(EdgeKind::Pipeline).build());
    assert!(matches!(
        index.validate(),
        Err(EdgeError::Validation { code: "E_EDGE_NAME_REQUIRED", .. })
    ));
}
