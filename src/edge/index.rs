//! The `edges.v1` debug artifact: every edge descriptor of a package.
//!
//! Written by the build under `build/debug/asm/<package>/edges.json` and read
//! back by the runtime to size and configure queues.

use crate::edge::descriptor::EdgeDescriptor;
use crate::edge::error::{EdgeError, EdgeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Schema tag of the edges index.
pub const EDGES_SCHEMA: &str = "edges.v1";

/// File name of the edges index within a package directory.
pub const EDGES_FILE: &str = "edges.json";

/// Index of all edges in a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgesIndex {
    pub schema: String,
    pub package: String,
    #[serde(default)]
    pub edges: Vec<EdgeDescriptor>,
}

impl EdgesIndex {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            schema: EDGES_SCHEMA.to_string(),
            package: package.into(),
            edges: Vec::new(),
        }
    }

    /// Conventional location of a package's index below `root`.
    pub fn default_path(root: impl AsRef<Path>, package: &str) -> PathBuf {
        root.as_ref()
            .join("build")
            .join("debug")
            .join("asm")
            .join(package)
            .join(EDGES_FILE)
    }

    pub fn push(&mut self, edge: EdgeDescriptor) {
        self.edges.push(edge);
    }

    /// Sort edges deterministically by unit, pipeline, segment, step and label.
    pub fn sort(&mut self) {
        self.edges.sort_by(|a, b| {
            (&a.unit, &a.pipeline, a.segment as u8, a.step, &a.label).cmp(&(
                &b.unit,
                &b.pipeline,
                b.segment as u8,
                b.step,
                &b.label,
            ))
        });
    }

    pub fn find(&self, label: &str) -> Option<&EdgeDescriptor> {
        self.edges.iter().find(|e| e.label == label)
    }

    /// Edges belonging to one pipeline, in index order.
    pub fn pipeline_edges<'a>(
        &'a self,
        pipeline: &'a str,
    ) -> impl Iterator<Item = &'a EdgeDescriptor> + 'a {
        self.edges.iter().filter(move |e| e.pipeline == pipeline)
    }

    pub fn check_schema(&self) -> EdgeResult<()> {
        if self.schema != EDGES_SCHEMA {
            return Err(EdgeError::Schema {
                expected: EDGES_SCHEMA,
                found: self.schema.clone(),
            });
        }
        Ok(())
    }

    /// Check the schema tag and every descriptor.
    pub fn validate(&self) -> EdgeResult<()> {
        self.check_schema()?;
        self.edges.iter().try_for_each(EdgeDescriptor::validate)
    }

    pub fn from_json(json: &str) -> EdgeResult<Self> {
        let index: EdgesIndex = serde_json::from_str(json)?;
        index.check_schema()?;
        Ok(index)
    }

    pub fn to_json_pretty(&self) -> EdgeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load an index from a file.
    pub fn load(path: impl AsRef<Path>) -> EdgeResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Sort and write the index to `path`, creating parent directories.
    pub fn save(&mut self, path: impl AsRef<Path>) -> EdgeResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.sort();
        std::fs::write(path, self.to_json_pretty()?)?;
        tracing::debug!(
            "Wrote {} edges for package {} to {:?}",
            self.edges.len(),
            self.package,
            path
        );
        Ok(())
    }
}
