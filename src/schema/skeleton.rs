//! Keypoint skeletons
//!
//! A skeleton names the points of a keypoint label in positional order.
//! Keypoint parallel arrays (`points`, `confidence`, custom attributes) are
//! interpreted through it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skeleton {
    /// Point labels in array order
    pub labels: Vec<String>,
    /// Connectivity as index pairs (or longer chains)
    #[serde(default)]
    pub edges: Vec<Vec<usize>>,
}

impl Skeleton {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            edges: Vec::new(),
        }
    }

    pub fn with_edges(mut self, edges: Vec<Vec<usize>>) -> Self {
        self.edges = edges;
        self
    }

    /// Labels not in `values`, in skeleton order
    pub fn complement(&self, values: &[String]) -> Vec<String> {
        self.labels
            .iter()
            .filter(|label| !values.contains(label))
            .cloned()
            .collect()
    }
}

/// Per-field skeletons with a dataset-wide fallback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonRegistry {
    #[serde(default)]
    pub skeletons: BTreeMap<String, Skeleton>,
    #[serde(default)]
    pub default_skeleton: Option<Skeleton>,
}

impl SkeletonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: impl Into<String>, skeleton: Skeleton) -> Self {
        self.skeletons.insert(field.into(), skeleton);
        self
    }

    pub fn with_default(mut self, skeleton: Skeleton) -> Self {
        self.default_skeleton = Some(skeleton);
        self
    }

    /// Skeleton for a keypoint field, falling back to the default
    pub fn get(&self, field: &str) -> Option<&Skeleton> {
        self.skeletons
            .get(field)
            .or(self.default_skeleton.as_ref())
    }
}
