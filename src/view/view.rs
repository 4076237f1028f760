//! The compiled view value
//!
//! A `View` is a dataset plus an ordered stage list. Each build owns its own
//! `View`; only the dataset behind it is shared.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::stages::{Stage, StageResult};

use super::dataset::Dataset;

#[derive(Clone)]
pub struct View {
    dataset: Arc<Dataset>,
    stages: Vec<Stage>,
    group_slice: Option<String>,
}

impl View {
    /// The full, unfiltered view of a dataset
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let group_slice = dataset.default_group_slice.clone();
        Self {
            dataset,
            stages: Vec::new(),
            group_slice,
        }
    }

    /// Rebuilds a view from serialized stages
    pub fn from_dicts(dataset: Arc<Dataset>, stages: &[Value]) -> StageResult<Self> {
        let mut view = Self::new(dataset);
        for stage in stages {
            view.stages.push(Stage::from_dict(stage)?);
        }
        Ok(view)
    }

    /// Empty view over the same dataset and active slice
    pub fn base(&self) -> Self {
        Self {
            dataset: Arc::clone(&self.dataset),
            stages: Vec::new(),
            group_slice: self.group_slice.clone(),
        }
    }

    pub fn add_stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn extend_stages(&mut self, stages: impl IntoIterator<Item = Stage>) {
        self.stages.extend(stages);
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn group_slice(&self) -> Option<&str> {
        self.group_slice.as_deref()
    }

    pub fn set_group_slice(&mut self, slice: Option<String>) {
        self.group_slice = slice;
    }

    pub fn to_dicts(&self) -> StageResult<Vec<Value>> {
        self.stages.iter().map(Stage::to_dict).collect()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("dataset", &self.dataset.name)
            .field("stages", &self.stages)
            .field("group_slice", &self.group_slice)
            .finish()
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.dataset.name == other.dataset.name
            && self.stages == other.stages
            && self.group_slice == other.group_slice
    }
}
