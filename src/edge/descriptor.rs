//! Edge descriptors produced by the compiler for each pipeline step input.
//!
//! A descriptor is immutable once built. `bounded` and `delivery` are never
//! stored: they are recomputed from `maxCapacity` and `backpressure` every time
//! the descriptor is serialized, and ignored when one is read back.

use crate::edge::error::{EdgeError, EdgeResult};
use crate::edge::policy::{derive_bounded_delivery, BackpressurePolicy, Delivery};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Which step list of a pipeline the edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    #[default]
    Normal,
    Error,
}

/// Declared edge shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EdgeKind {
    #[default]
    #[serde(rename = "edge.FIFO")]
    Fifo,
    #[serde(rename = "edge.LIFO")]
    Lifo,
    /// Input fed by another pipeline's egress; buffered FIFO.
    #[serde(rename = "edge.Pipeline")]
    Pipeline,
    /// Several inputs merged by a Collect stage.
    #[serde(rename = "edge.MultiPath")]
    MultiPath,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Fifo => "edge.FIFO",
            EdgeKind::Lifo => "edge.LIFO",
            EdgeKind::Pipeline => "edge.Pipeline",
            EdgeKind::MultiPath => "edge.MultiPath",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input of a MultiPath edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiPathInput {
    pub kind: EdgeKind,
    #[serde(default)]
    pub min_capacity: usize,
    #[serde(default)]
    pub max_capacity: usize,
    #[serde(default)]
    pub backpressure: BackpressurePolicy,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub payload_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
}

/// A merge operation name with its raw arguments (`merge.Sort("ts","asc")`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOp {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Declarative MultiPath configuration. Carried for downstream merge stages;
/// nothing in this crate executes it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiPath {
    #[serde(default)]
    pub inputs: Vec<MultiPathInput>,
    #[serde(default)]
    pub merge: Vec<MergeOp>,
}

/// A validation finding for a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDiagnostic {
    pub code: &'static str,
    pub message: String,
}

/// Compile-time declaration of one pipeline edge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescriptor {
    #[serde(default)]
    pub unit: String,
    pub pipeline: String,
    #[serde(default)]
    pub segment: Segment,
    pub step: usize,
    #[serde(default)]
    pub node: String,
    pub label: String,
    pub kind: EdgeKind,
    #[serde(default)]
    pub min_capacity: usize,
    #[serde(default)]
    pub max_capacity: usize,
    #[serde(default)]
    pub backpressure: BackpressurePolicy,
    #[serde(rename = "type", default)]
    pub payload_type: String,
    #[serde(default)]
    pub upstream: Option<String>,
    #[serde(default)]
    pub multipath: Option<MultiPath>,
}

/// Wire shape of a descriptor, including the derived fields.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DescriptorRecord<'a> {
    unit: &'a str,
    pipeline: &'a str,
    segment: Segment,
    step: usize,
    node: &'a str,
    label: &'a str,
    kind: EdgeKind,
    min_capacity: usize,
    max_capacity: usize,
    backpressure: &'a BackpressurePolicy,
    #[serde(rename = "type")]
    payload_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multipath: Option<&'a MultiPath>,
    bounded: bool,
    delivery: Delivery,
}

impl Serialize for EdgeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (bounded, delivery) = self.derived();
        DescriptorRecord {
            unit: &self.unit,
            pipeline: &self.pipeline,
            segment: self.segment,
            step: self.step,
            node: &self.node,
            label: &self.label,
            kind: self.kind,
            min_capacity: self.min_capacity,
            max_capacity: self.max_capacity,
            backpressure: &self.backpressure,
            payload_type: &self.payload_type,
            upstream: self.upstream.as_deref(),
            multipath: self.multipath.as_ref(),
            bounded,
            delivery,
        }
        .serialize(serializer)
    }
}

impl EdgeDescriptor {
    /// Descriptor for the input edge of `pipeline`'s step `step`.
    ///
    /// The label follows the compiler's `<pipeline>.step<N>.in` convention.
    pub fn new(kind: EdgeKind, pipeline: impl Into<String>, step: usize) -> Self {
        let pipeline = pipeline.into();
        let label = format!("{}.step{}.in", pipeline, step);
        Self {
            unit: String::new(),
            pipeline,
            segment: Segment::Normal,
            step,
            node: String::new(),
            label,
            kind,
            min_capacity: 0,
            max_capacity: 0,
            backpressure: BackpressurePolicy::Block,
            payload_type: String::new(),
            upstream: None,
            multipath: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segment = segment;
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_capacity(mut self, min: usize, max: usize) -> Self {
        self.min_capacity = min;
        self.max_capacity = max;
        self
    }

    pub fn with_backpressure(mut self, policy: impl Into<BackpressurePolicy>) -> Self {
        self.backpressure = policy.into();
        self
    }

    pub fn with_type(mut self, payload_type: impl Into<String>) -> Self {
        self.payload_type = payload_type.into();
        self
    }

    pub fn with_upstream(mut self, upstream: impl Into<String>) -> Self {
        self.upstream = Some(upstream.into());
        self
    }

    pub fn with_multipath(mut self, multipath: MultiPath) -> Self {
        self.multipath = Some(multipath);
        self
    }

    /// `(bounded, delivery)`, always computed from the current fields.
    pub fn derived(&self) -> (bool, Delivery) {
        derive_bounded_delivery(self.max_capacity, &self.backpressure)
    }

    pub fn bounded(&self) -> bool {
        self.derived().0
    }

    pub fn delivery(&self) -> Delivery {
        self.derived().1
    }

    /// All validation findings, in a stable order.
    pub fn diagnostics(&self) -> Vec<EdgeDiagnostic> {
        let mut diags = Vec::new();
        let kind = self.kind;
        if self.max_capacity > 0 && self.max_capacity < self.min_capacity {
            diags.push(EdgeDiagnostic {
                code: "E_EDGE_CAP_ORDER",
                message: format!("{}: maxCapacity must be >= minCapacity", kind),
            });
        }
        if !self.backpressure.is_recognized() {
            diags.push(EdgeDiagnostic {
                code: "E_EDGE_BP_INVALID",
                message: format!(
                    "{}: invalid backpressure policy {:?}",
                    kind,
                    self.backpressure.as_str()
                ),
            });
        }
        if kind == EdgeKind::Pipeline
            && self.upstream.as_deref().map_or(true, |s| s.trim().is_empty())
        {
            diags.push(EdgeDiagnostic {
                code: "E_EDGE_NAME_REQUIRED",
                message: format!("{}: upstream name required", kind),
            });
        }
        diags
    }

    /// Fail on the first diagnostic.
    pub fn validate(&self) -> EdgeResult<()> {
        match self.diagnostics().into_iter().next() {
            Some(d) => Err(EdgeError::Validation {
                label: self.label.clone(),
                code: d.code,
                message: d.message,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifo_edge() -> EdgeDescriptor {
        EdgeDescriptor::new(EdgeKind::Lifo, "P", 2)
            .with_unit("main.ami")
            .with_node("Egress")
            .with_capacity(2, 4)
            .with_backpressure("block")
            .with_type("int")
    }

    #[test]
    fn test_default_label() {
        assert_eq!(lifo_edge().label, "P.step2.in");
    }

    #[test]
    fn test_derived_fields_serialized() {
        let json = serde_json::to_value(lifo_edge()).unwrap();
        assert_eq!(json["kind"], "edge.LIFO");
        assert_eq!(json["minCapacity"], 2);
        assert_eq!(json["maxCapacity"], 4);
        assert_eq!(json["backpressure"], "block");
        assert_eq!(json["type"], "int");
        assert_eq!(json["segment"], "normal");
        assert_eq!(json["bounded"], true);
        assert_eq!(json["delivery"], "atLeastOnce");
        assert!(json.get("upstream").is_none());
    }

    #[test]
    fn test_derived_fields_follow_source_fields() {
        let edge = lifo_edge().with_capacity(0, 0).with_backpressure("dropNewest");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["bounded"], false);
        assert_eq!(json["delivery"], "bestEffort");
    }

    #[test]
    fn test_stale_derived_fields_ignored_on_read() {
        let raw = r#"{
            "pipeline": "P", "step": 1, "label": "P.step1.in", "kind": "edge.FIFO",
            "maxCapacity": 0, "backpressure": "block",
            "bounded": true, "delivery": "bestEffort"
        }"#;
        let edge: EdgeDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(edge.derived(), (false, Delivery::AtLeastOnce));
    }

    #[test]
    fn test_validate_capacity_order() {
        let edge = lifo_edge().with_capacity(5, 2);
        let err = edge.validate().unwrap_err();
        assert!(err.to_string().contains("E_EDGE_CAP_ORDER"));
    }

    #[test]
    fn test_unbounded_ignores_min() {
        assert!(lifo_edge().with_capacity(5, 0).validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_policy() {
        let diags = lifo_edge().with_backpressure("drop").diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "E_EDGE_BP_INVALID");
    }

    #[test]
    fn test_pipeline_edge_requires_upstream() {
        let edge = EdgeDescriptor::new(EdgeKind::Pipeline, "P", 1);
        assert_eq!(edge.diagnostics()[0].code, "E_EDGE_NAME_REQUIRED");
        assert!(edge.with_upstream("Up").validate().is_ok());
    }

    #[test]
    fn test_multipath_round_trips() {
        let mp = MultiPath {
            inputs: vec![MultiPathInput {
                kind: EdgeKind::Pipeline,
                min_capacity: 0,
                max_capacity: 0,
                backpressure: BackpressurePolicy::DropNewest,
                payload_type: "int".into(),
                upstream: Some("Up".into()),
            }],
            merge: vec![MergeOp {
                name: "Sort".into(),
                args: vec!["ts".into(), "asc".into()],
            }],
        };
        let edge = EdgeDescriptor::new(EdgeKind::MultiPath, "P", 1).with_multipath(mp.clone());
        let json = serde_json::to_string(&edge).unwrap();
        let back: EdgeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.multipath, Some(mp));
        assert_eq!(back.kind, EdgeKind::MultiPath);
    }
}
