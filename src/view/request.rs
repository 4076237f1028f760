//! Request wire types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::filters::Filters;
use crate::schema::MediaType;

/// Narrows a grouped dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFilter {
    /// Group id; selects every sample of that group
    #[serde(default)]
    pub id: Option<String>,
    /// Active slice
    #[serde(default)]
    pub slice: Option<String>,
    /// Slices to flatten across
    #[serde(default)]
    pub slices: Option<Vec<String>>,
}

impl GroupFilter {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.slice.is_none() && self.slices.is_none()
    }
}

/// Sample-level narrowing applied before any filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFilter {
    #[serde(default)]
    pub group: Option<GroupFilter>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Everything `get_view` accepts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ViewRequest {
    /// Dataset name
    pub dataset: String,
    /// Saved view; when set, every other option is ignored
    #[serde(default)]
    pub view_name: Option<String>,
    /// Serialized base stages
    #[serde(default)]
    pub stages: Option<Vec<Value>>,
    #[serde(default)]
    pub filters: Option<Filters>,
    /// Paginated display: drop dict fields, attach label-tag counts
    #[serde(default)]
    pub pagination_data: bool,
    /// Stage class name to kwargs, applied in insertion order
    #[serde(default)]
    pub extended_stages: Option<Map<String, Value>>,
    #[serde(default)]
    pub sample_filter: Option<SampleFilter>,
    #[serde(default)]
    pub reload: bool,
}

impl ViewRequest {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            ..Self::default()
        }
    }

    /// Whether anything beyond the base view was asked for
    pub fn needs_extension(&self) -> bool {
        self.filters.is_some() || self.extended_stages.is_some() || self.pagination_data
    }

    pub fn extended(&self) -> ExtendedRequest {
        ExtendedRequest {
            filters: self.filters.clone(),
            extended_stages: self.extended_stages.clone(),
            pagination_data: self.pagination_data,
            media_types: None,
        }
    }
}

/// Arguments of `get_extended_view`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedRequest {
    pub filters: Option<Filters>,
    pub extended_stages: Option<Map<String, Value>>,
    pub pagination_data: bool,
    /// Media types resolved from a group filter, if any
    pub media_types: Option<BTreeSet<MediaType>>,
}
