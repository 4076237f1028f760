//! Declarative view stages
//!
//! A stage is one transform primitive in a view. Stages serialize as
//! `{"_cls": "<Name>", "kwargs": {...}}`; that is also the shape clients send
//! for saved and ad hoc views.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::expr::{Expr, ObjectId, Query};

use super::errors::{StageError, StageResult};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_cls", content = "kwargs")]
pub enum Stage {
    /// Keeps documents satisfying a document-level condition
    Match { filter: Value },

    /// Keeps documents with (or, if `matching` is false, without) any of `tags`
    MatchTags {
        tags: Vec<String>,
        #[serde(rename = "bool", default = "default_true")]
        matching: bool,
    },

    /// Sets `field` to the value of an expression
    SetField {
        field: String,
        expr: Value,
        #[serde(default)]
        allow_missing: bool,
    },

    /// Filters the labels of a label field; `$$this` is bound to each label
    FilterLabels {
        field: String,
        filter: Value,
        #[serde(default = "default_true")]
        only_matches: bool,
    },

    /// Filters individual points of keypoint labels
    FilterKeypoints {
        field: String,
        #[serde(default)]
        filter: Option<Value>,
        #[serde(default)]
        labels: Option<Vec<String>>,
        #[serde(default = "default_true")]
        only_matches: bool,
    },

    SelectFields { field_names: Vec<String> },

    ExcludeFields { field_names: Vec<String> },

    Select {
        sample_ids: Vec<String>,
        #[serde(default)]
        ordered: bool,
    },

    SelectBy {
        field: String,
        values: Vec<Value>,
        #[serde(default)]
        ordered: bool,
    },

    Exclude { sample_ids: Vec<String> },

    /// Narrows (or flattens) a grouped collection to the given slices
    SelectGroupSlices {
        #[serde(default)]
        slices: Option<Vec<String>>,
        #[serde(default)]
        allow_mixed: bool,
        #[serde(default)]
        force_mixed: bool,
    },

    GroupBy {
        field_or_expr: String,
        #[serde(default)]
        order_by: Option<String>,
        #[serde(default)]
        reverse: bool,
    },

    SortBy {
        field_or_expr: Value,
        #[serde(default)]
        reverse: bool,
    },

    SortBySimilarity {
        query: Value,
        #[serde(default)]
        k: Option<usize>,
        #[serde(default)]
        reverse: bool,
        #[serde(default)]
        dist_field: Option<String>,
        #[serde(default)]
        brain_key: Option<String>,
    },

    Limit { limit: usize },

    Skip { skip: usize },

    Take {
        size: usize,
        #[serde(default)]
        seed: Option<u64>,
    },

    Shuffle {
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Raw executor pipeline
    Mongo { pipeline: Vec<Value> },
}

impl Stage {
    /// Decodes a serialized stage
    pub fn from_dict(value: &Value) -> StageResult<Self> {
        let name = value
            .get("_cls")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();
        serde_json::from_value(value.clone()).map_err(|e| StageError::invalid(name, e.to_string()))
    }

    /// Builds a stage from a class name and keyword arguments.
    ///
    /// Fully qualified names are accepted; only the last component is used.
    pub fn from_extended(class_name: &str, kwargs: &Value) -> StageResult<Self> {
        let name = class_name.rsplit('.').next().unwrap_or(class_name);
        Self::from_dict(&json!({"_cls": name, "kwargs": kwargs}))
    }

    /// Encodes the stage in its serialized `{"_cls", "kwargs"}` form
    pub fn to_dict(&self) -> StageResult<Value> {
        serde_json::to_value(self).map_err(|e| StageError::invalid(self.name(), e.to_string()))
    }

    /// Stage class name
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match { .. } => "Match",
            Stage::MatchTags { .. } => "MatchTags",
            Stage::SetField { .. } => "SetField",
            Stage::FilterLabels { .. } => "FilterLabels",
            Stage::FilterKeypoints { .. } => "FilterKeypoints",
            Stage::SelectFields { .. } => "SelectFields",
            Stage::ExcludeFields { .. } => "ExcludeFields",
            Stage::Select { .. } => "Select",
            Stage::SelectBy { .. } => "SelectBy",
            Stage::Exclude { .. } => "Exclude",
            Stage::SelectGroupSlices { .. } => "SelectGroupSlices",
            Stage::GroupBy { .. } => "GroupBy",
            Stage::SortBy { .. } => "SortBy",
            Stage::SortBySimilarity { .. } => "SortBySimilarity",
            Stage::Limit { .. } => "Limit",
            Stage::Skip { .. } => "Skip",
            Stage::Take { .. } => "Take",
            Stage::Shuffle { .. } => "Shuffle",
            Stage::Mongo { .. } => "Mongo",
        }
    }

    /// Whether the stage drops or reorders documents.
    ///
    /// A select-by-id placed before such a stage would change its result, so
    /// optimized selection and group flattening consult this before moving
    /// stages around.
    pub fn reorders_or_selects(&self) -> bool {
        match self {
            Stage::Match { .. }
            | Stage::MatchTags { .. }
            | Stage::Select { .. }
            | Stage::SelectBy { .. }
            | Stage::Exclude { .. }
            | Stage::GroupBy { .. }
            | Stage::SortBy { .. }
            | Stage::SortBySimilarity { .. }
            | Stage::Limit { .. }
            | Stage::Skip { .. }
            | Stage::Take { .. }
            | Stage::Shuffle { .. }
            | Stage::Mongo { .. } => true,
            Stage::FilterLabels { only_matches, .. }
            | Stage::FilterKeypoints { only_matches, .. } => *only_matches,
            Stage::SetField { .. }
            | Stage::SelectFields { .. }
            | Stage::ExcludeFields { .. }
            | Stage::SelectGroupSlices { .. } => false,
        }
    }

    /// Whether the stage already narrows a grouped collection to slices
    pub fn selects_group_slices(&self) -> bool {
        matches!(self, Stage::SelectGroupSlices { .. })
    }

    /// Whether the stage groups documents by `field`
    pub fn groups_by(&self, field: &str) -> bool {
        matches!(self, Stage::GroupBy { field_or_expr, .. } if field_or_expr == field)
    }

    pub fn match_query(query: &Query) -> Self {
        Stage::Match {
            filter: query.to_json(),
        }
    }

    pub fn match_tags(tags: Vec<String>, matching: bool) -> Self {
        Stage::MatchTags { tags, matching }
    }

    pub fn set_field(field: impl Into<String>, expr: &Expr) -> Self {
        Stage::SetField {
            field: field.into(),
            expr: expr.to_json(),
            allow_missing: true,
        }
    }

    pub fn filter_labels(field: impl Into<String>, filter: &Expr, only_matches: bool) -> Self {
        Stage::FilterLabels {
            field: field.into(),
            filter: filter.to_json(),
            only_matches,
        }
    }

    /// Keeps only points whose skeleton label is in `labels`
    pub fn filter_keypoints_by_label(field: impl Into<String>, labels: Vec<String>) -> Self {
        Stage::FilterKeypoints {
            field: field.into(),
            filter: None,
            labels: Some(labels),
            only_matches: true,
        }
    }

    /// Keeps only points for which `filter` holds (`$$this` is the point)
    pub fn filter_keypoints(field: impl Into<String>, filter: &Expr) -> Self {
        Stage::FilterKeypoints {
            field: field.into(),
            filter: Some(filter.to_json()),
            labels: None,
            only_matches: true,
        }
    }

    pub fn exclude_fields(field_names: Vec<String>) -> Self {
        Stage::ExcludeFields { field_names }
    }

    /// Selects documents by id; malformed ids are rejected
    pub fn select<S: AsRef<str>>(sample_ids: &[S], ordered: bool) -> StageResult<Self> {
        let ids = ObjectId::parse_all(sample_ids)?;
        Ok(Stage::Select {
            sample_ids: ids.iter().map(ObjectId::to_hex).collect(),
            ordered,
        })
    }

    /// Selects documents whose `field` holds one of the given ids
    pub fn select_by_ids<S: AsRef<str>>(field: impl Into<String>, ids: &[S]) -> StageResult<Self> {
        let ids = ObjectId::parse_all(ids)?;
        Ok(Stage::SelectBy {
            field: field.into(),
            values: ids.iter().map(|id| json!({"$oid": id.to_hex()})).collect(),
            ordered: false,
        })
    }

    pub fn select_group_slices(slices: Option<Vec<String>>, force_mixed: bool) -> Self {
        Stage::SelectGroupSlices {
            slices,
            allow_mixed: force_mixed,
            force_mixed,
        }
    }
}
