//! View orchestration
//!
//! `get_view` turns a request into a `View`:
//!
//! 1. resolve the dataset
//! 2. a saved view is returned as stored, bypassing every ad hoc option
//! 3. otherwise rebuild from `stages` (or start from the full dataset)
//! 4. apply the sample filter (group filter, or id select)
//! 5. extend with stages, projection and filters if asked
//!
//! `get_extended_view` appends, in this order: extended stages, the
//! pagination projection, sample-tag filter, label-tag filter, match stage,
//! embedded-list filters, label filters, label-tag counts. The executor runs
//! stages in sequence, so this order is part of the result.

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::filters::{make_filter_stages, FilterContext, Filters, TAGS_PATH};
use crate::groups::{make_optimized_select_view, resolve_group_filter};
use crate::label_tags::{
    label_tag_count_stages, label_tag_sources, label_tags_filter_stages, LABEL_TAGS_FIELD,
};
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::schema::{FieldKind, MediaType};
use crate::stages::Stage;

use super::config::CompilerConfig;
use super::dataset::DatasetSource;
use super::errors::{ViewError, ViewResult};
use super::request::{ExtendedRequest, ViewRequest};
use super::view::View;

/// A built view and the media types it may contain
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledView {
    pub view: View,
    /// Known only when a group filter was resolved
    pub media_types: Option<BTreeSet<MediaType>>,
}

impl CompiledView {
    pub fn stages(&self) -> &[Stage] {
        self.view.stages()
    }
}

/// Builds views for requests against datasets from one source
#[derive(Clone)]
pub struct ViewCompiler {
    source: Arc<dyn DatasetSource>,
    config: CompilerConfig,
}

impl ViewCompiler {
    pub fn new(source: Arc<dyn DatasetSource>, config: CompilerConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Builds the view for `request`
    pub fn get_view(&self, request: &ViewRequest) -> ViewResult<CompiledView> {
        let build_id = Uuid::new_v4().to_string();
        let scope = ObservationScope::with_fields(
            "VIEW_BUILD",
            &[("build_id", build_id.as_str()), ("dataset", request.dataset.as_str())],
        );

        match self.build(request) {
            Ok(compiled) => {
                let stages = compiled.stages().len().to_string();
                scope.complete_with_fields(&[("stages", stages.as_str())]);
                Ok(compiled)
            }
            Err(err) => {
                scope.fail(err.code(), &err.to_string());
                Err(err)
            }
        }
    }

    /// Same as `get_view`, run on the blocking pool.
    ///
    /// Construction has no suspension points; cancelling the returned future
    /// does not stop a build already running.
    pub async fn get_view_async(&self, request: ViewRequest) -> ViewResult<CompiledView> {
        let compiler = self.clone();
        tokio::task::spawn_blocking(move || compiler.get_view(&request))
            .await
            .map_err(|e| ViewError::TaskFailed {
                reason: e.to_string(),
            })?
    }

    fn build(&self, request: &ViewRequest) -> ViewResult<CompiledView> {
        let dataset = self.source.load_dataset(&request.dataset, request.reload)?;

        if let Some(name) = &request.view_name {
            let view = View::from_dicts(Arc::clone(&dataset), dataset.saved_view(name)?)?;
            log_event_with_fields(
                Event::SavedViewLoaded,
                &[("dataset", dataset.name.as_str()), ("view", name.as_str())],
            );
            return Ok(CompiledView {
                view,
                media_types: None,
            });
        }

        let mut view = match &request.stages {
            Some(stages) => View::from_dicts(dataset, stages)?,
            None => View::new(dataset),
        };

        let mut media_types = None;
        if let Some(sample_filter) = &request.sample_filter {
            if let Some(group) = &sample_filter.group {
                let (resolved, types) = resolve_group_filter(view, group)?;
                view = resolved;
                media_types = types;
            } else if let Some(id) = &sample_filter.id {
                view = make_optimized_select_view(&view, &[id], false)?;
            }
        }

        if request.needs_extension() {
            let extended = ExtendedRequest {
                media_types: media_types.clone(),
                ..request.extended()
            };
            view = self.get_extended_view(view, &extended)?;
        }

        Ok(CompiledView { view, media_types })
    }

    /// Appends extended stages, projection and filter stages to `view`
    pub fn get_extended_view(&self, view: View, request: &ExtendedRequest) -> ViewResult<View> {
        let mut view = view;

        // Extended stages see the unfiltered universe
        if let Some(extended) = &request.extended_stages {
            for (class_name, kwargs) in extended {
                view.add_stage(Stage::from_extended(class_name, kwargs)?);
            }
        }

        if request.pagination_data && self.config.project_dicts_on_pagination {
            let dicts = self.dict_fields(&view, request.media_types.as_ref());
            if !dicts.is_empty() {
                view.add_stage(Stage::exclude_fields(dicts));
            }
        }

        if let Some(filters) = &request.filters {
            let stages = self.filter_stages(&view, filters)?;
            view.extend_stages(stages);
        }

        if request.pagination_data && self.config.count_label_tags {
            let sources = label_tag_sources(view.dataset().schema.as_ref());
            view.extend_stages(label_tag_count_stages(&sources));
        }

        Ok(view)
    }

    /// Every dict field of the sample schema, plus the frame schema when
    /// frames may be present
    fn dict_fields(&self, view: &View, media_types: Option<&BTreeSet<MediaType>>) -> Vec<String> {
        let dataset = view.dataset();
        let catalog = dataset.schema.as_ref();
        let with_frames = match media_types {
            Some(types) => types.contains(&MediaType::Video),
            None => dataset.has_frames(),
        };

        let mut fields = catalog.get_field_schema(true);
        if with_frames {
            fields.extend(catalog.get_frame_field_schema(true));
        }
        fields
            .into_iter()
            .filter(|f| f.kind == FieldKind::Dict)
            .map(|f| f.path.clone())
            .collect()
    }

    fn filter_stages(&self, view: &View, filters: &Filters) -> ViewResult<Vec<Stage>> {
        let dataset = view.dataset();
        let catalog = dataset.schema.as_ref();
        let mut stages = Vec::new();

        if let Some(tags) = filters.get(TAGS_PATH) {
            stages.push(Stage::match_tags(tags.present_values(), !tags.exclude));
        }

        if let Some(spec) = filters.get(LABEL_TAGS_FIELD) {
            let sources = label_tag_sources(catalog);
            stages.extend(label_tags_filter_stages(&sources, spec)?);
        }

        let ctx = FilterContext::new(catalog, &dataset.skeletons)
            .with_exclude_drops_empty(self.config.exclude_drops_empty);
        stages.extend(make_filter_stages(&ctx, filters)?);

        let filter_count = filters.len().to_string();
        let stage_count = stages.len().to_string();
        log_event_with_fields(
            Event::FilterStagesCompiled,
            &[
                ("dataset", dataset.name.as_str()),
                ("filters", filter_count.as_str()),
                ("stages", stage_count.as_str()),
            ],
        );

        Ok(stages)
    }
}
