//! Test data builders for creating test objects

use edgeflow::edge::{EdgeDescriptor, EdgeKind, EdgesIndex, Segment};

/// Builder for creating test edge descriptors
pub struct EdgeBuilder {
    kind: EdgeKind,
    pipeline: String,
    step: usize,
    min: usize,
    max: usize,
    backpressure: String,
    upstream: Option<String>,
    segment: Segment,
}

impl EdgeBuilder {
    pub fn new(pipeline: &str, step: usize) -> Self {
        Self {
            kind: EdgeKind::Fifo,
            pipeline: pipeline.to_string(),
            step,
            min: 0,
            max: 0,
            backpressure: "block".to_string(),
            upstream: None,
            segment: Segment::Normal,
        }
    }

    pub fn kind(mut self, kind: EdgeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn capacity(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn backpressure(mut self, policy: &str) -> Self {
        self.backpressure = policy.to_string();
        self
    }

    pub fn upstream(mut self, upstream: &str) -> Self {
        self.upstream = Some(upstream.to_string());
        self
    }

    pub fn error_segment(mut self) -> Self {
        self.segment = Segment::Error;
        self
    }

    pub fn build(self) -> EdgeDescriptor {
        let mut edge = EdgeDescriptor::new(self.kind, self.pipeline, self.step)
            .with_unit("unit_a")
            .with_segment(self.segment)
            .with_capacity(self.min, self.max)
            .with_backpressure(self.backpressure.as_str())
            .with_type("[]byte");
        if let Some(up) = self.upstream {
            edge = edge.with_upstream(up);
        }
        edge
    }
}

/// An index with one edge of every kind.
pub fn sample_index(package: &str) -> EdgesIndex {
    let mut index = EdgesIndex::new(package);
    index.push(EdgeBuilder::new("Ingest", 2).capacity(1, 8).backpressure("dropOldest").build());
    index.push(EdgeBuilder::new("Ingest", 1).capacity(0, 4).build());
    index.push(EdgeBuilder::new("Stack", 1).kind(EdgeKind::Lifo).capacity(0, 2).build());
    index.push(
        EdgeBuilder::new("Downstream", 1)
            .kind(EdgeKind::Pipeline)
            .upstream("Ingest")
            .build(),
    );
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_builder() {
        let edge = EdgeBuilder::new("P", 3)
            .kind(EdgeKind::Lifo)
            .capacity(2, 6)
            .backpressure("dropNewest")
            .build();

        assert_eq!(edge.label, "P.step3.in");
        assert_eq!(edge.kind, EdgeKind::Lifo);
        assert_eq!(edge.max_capacity, 6);
        assert!(edge.bounded());
    }
}
