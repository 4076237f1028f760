//! Datasets and where they come from
//!
//! A `Dataset` bundles what the compiler reads about a collection: its
//! schema, media type, group layout, keypoint skeletons and saved views.
//! Datasets are immutable once built and shared behind `Arc`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{FieldKind, LabelKind, MediaType, Schema, SchemaCatalog, SkeletonRegistry};

use super::errors::{ViewError, ViewResult};

#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub media_type: MediaType,
    /// Embedded field holding `{_id, name}` group membership
    pub group_field: Option<String>,
    /// Media type of each group slice
    pub group_media_types: BTreeMap<String, MediaType>,
    pub default_group_slice: Option<String>,
    pub schema: Arc<dyn SchemaCatalog>,
    pub skeletons: SkeletonRegistry,
    /// Serialized stage lists by view name
    pub saved_views: BTreeMap<String, Vec<Value>>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, media_type: MediaType, schema: Arc<dyn SchemaCatalog>) -> Self {
        Self {
            name: name.into(),
            media_type,
            group_field: None,
            group_media_types: BTreeMap::new(),
            default_group_slice: None,
            schema,
            skeletons: SkeletonRegistry::new(),
            saved_views: BTreeMap::new(),
        }
    }

    /// Makes this a grouped dataset with the given slices
    pub fn with_groups(
        mut self,
        group_field: impl Into<String>,
        slices: impl IntoIterator<Item = (String, MediaType)>,
        default_slice: Option<String>,
    ) -> Self {
        self.media_type = MediaType::Group;
        self.group_field = Some(group_field.into());
        self.group_media_types = slices.into_iter().collect();
        self.default_group_slice = default_slice;
        self
    }

    pub fn with_skeletons(mut self, skeletons: SkeletonRegistry) -> Self {
        self.skeletons = skeletons;
        self
    }

    pub fn with_saved_view(mut self, name: impl Into<String>, stages: Vec<Value>) -> Self {
        self.saved_views.insert(name.into(), stages);
        self
    }

    pub fn is_grouped(&self) -> bool {
        self.group_field.is_some()
    }

    /// Whether frame-level fields may be present
    pub fn has_frames(&self) -> bool {
        self.media_type == MediaType::Video
            || self.group_media_types.values().any(|m| *m == MediaType::Video)
    }

    /// Media types of every slice, or the dataset's own type if not grouped
    pub fn media_types(&self) -> BTreeSet<MediaType> {
        if self.group_media_types.is_empty() {
            return BTreeSet::from([self.media_type]);
        }
        self.group_media_types.values().copied().collect()
    }

    pub fn saved_view(&self, name: &str) -> ViewResult<&[Value]> {
        self.saved_views
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ViewError::SavedViewNotFound {
                dataset: self.name.clone(),
                view: name.to_string(),
            })
    }

    /// Builds a dataset from its JSON description
    pub fn from_description(desc: DatasetDescription) -> ViewResult<Self> {
        desc.validate()?;

        let mut builder = Schema::builder();
        for field in &desc.fields {
            builder = match &field.db_field {
                Some(db) => builder.field_with_db(field.path.as_str(), field.kind.clone(), db.as_str()),
                None => builder.field(field.path.as_str(), field.kind.clone()),
            };
        }
        for label in &desc.labels {
            let attrs: Vec<(&str, FieldKind)> = label
                .attributes
                .iter()
                .map(|(name, kind)| (name.as_str(), kind.clone()))
                .collect();
            builder = builder.label(label.path.as_str(), label.kind, &attrs);
        }

        Ok(Self {
            name: desc.name,
            media_type: desc.media_type,
            group_field: desc.group_field,
            group_media_types: desc.group_media_types,
            default_group_slice: desc.default_group_slice,
            schema: Arc::new(builder.build()),
            skeletons: desc.skeletons,
            saved_views: desc.saved_views,
        })
    }

    /// Loads a dataset description file
    pub fn load(path: &Path) -> ViewResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ViewError::invalid_dataset(format!("failed to read {}: {}", path.display(), e))
        })?;
        let desc: DatasetDescription = serde_json::from_str(&content)
            .map_err(|e| ViewError::invalid_dataset(format!("invalid JSON: {}", e)))?;
        Self::from_description(desc)
    }
}

/// A plain field in a dataset description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub path: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_field: Option<String>,
}

/// A label field; standard attributes are added automatically
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDescription {
    pub path: String,
    pub kind: LabelKind,
    #[serde(default)]
    pub attributes: BTreeMap<String, FieldKind>,
}

/// On-disk dataset description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescription {
    pub name: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub group_field: Option<String>,
    #[serde(default)]
    pub group_media_types: BTreeMap<String, MediaType>,
    #[serde(default)]
    pub default_group_slice: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
    #[serde(default)]
    pub labels: Vec<LabelDescription>,
    #[serde(default)]
    pub skeletons: SkeletonRegistry,
    #[serde(default)]
    pub saved_views: BTreeMap<String, Vec<Value>>,
}

impl DatasetDescription {
    fn validate(&self) -> ViewResult<()> {
        if self.name.trim().is_empty() {
            return Err(ViewError::invalid_dataset("name must not be empty"));
        }
        match (&self.group_field, self.group_media_types.is_empty()) {
            (Some(_), true) => {
                return Err(ViewError::invalid_dataset(
                    "grouped datasets need group_media_types",
                ))
            }
            (None, false) => {
                return Err(ViewError::invalid_dataset(
                    "group_media_types given without group_field",
                ))
            }
            _ => {}
        }
        if let Some(slice) = &self.default_group_slice {
            if !self.group_media_types.contains_key(slice) {
                return Err(ViewError::invalid_dataset(format!(
                    "default_group_slice '{}' is not a slice",
                    slice
                )));
            }
        }
        Ok(())
    }
}

/// Resolves datasets by name
pub trait DatasetSource: Send + Sync {
    /// Returns the dataset; `reload` asks the source to refresh cached state
    fn load_dataset(&self, name: &str, reload: bool) -> ViewResult<Arc<Dataset>>;
}

/// Fixed set of datasets held in memory; `reload` is a no-op
#[derive(Debug, Default, Clone)]
pub struct InMemoryDatasets {
    datasets: BTreeMap<String, Arc<Dataset>>,
}

impl InMemoryDatasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: Dataset) {
        self.datasets.insert(dataset.name.clone(), Arc::new(dataset));
    }

    pub fn with(mut self, dataset: Dataset) -> Self {
        self.insert(dataset);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }
}

impl DatasetSource for InMemoryDatasets {
    fn load_dataset(&self, name: &str, _reload: bool) -> ViewResult<Arc<Dataset>> {
        self.datasets
            .get(name)
            .cloned()
            .ok_or_else(|| ViewError::DatasetNotFound {
                name: name.to_string(),
            })
    }
}
