//! Stage assembly
//!
//! Turns classified paths into view stages:
//!
//! - one match stage ANDing every document-level predicate
//! - one set-field stage per filtered embedded-list path
//! - one filter-labels (or filter-keypoints) stage per filtered label path
//!
//! Every assembler walks paths in sorted order, so the same filters always
//! produce the same stage list.

use crate::expr::{Expr, Query};
use crate::schema::{SchemaCatalog, SkeletonRegistry};
use crate::stages::Stage;

use super::classify::{classify_label_paths, classify_scalar_paths, ClassifiedPath, ParentKind};
use super::errors::FilterResult;
use super::expression::build_expr;
use super::keypoints::{build_keypoint_stage, is_parallel_attribute, POINTS_ATTRIBUTE};
use super::scalar::build_query;
use super::spec::Filters;

/// Read-only lookups shared by the assemblers
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub catalog: &'a dyn SchemaCatalog,
    pub skeletons: &'a SkeletonRegistry,
    /// Excluding label filters also drop documents left without labels
    pub exclude_drops_empty: bool,
}

impl<'a> FilterContext<'a> {
    pub fn new(catalog: &'a dyn SchemaCatalog, skeletons: &'a SkeletonRegistry) -> Self {
        Self {
            catalog,
            skeletons,
            exclude_drops_empty: false,
        }
    }

    pub fn with_exclude_drops_empty(mut self, value: bool) -> Self {
        self.exclude_drops_empty = value;
        self
    }
}

/// Whether a keypoint parallel attribute is being filtered
fn is_keypoint_attribute(c: &ClassifiedPath<'_>) -> bool {
    match c.label_kind() {
        Some(kind) => is_parallel_attribute(kind, c.field),
        None => false,
    }
}

/// Whether the path prunes keypoints through its own stage.
///
/// `.points` filters name skeleton labels, which only the keypoint stage
/// resolves, so they prune even in matching mode.
fn prunes_keypoints(c: &ClassifiedPath<'_>) -> bool {
    is_keypoint_attribute(c) && (!c.spec.is_matching || c.field.name() == POINTS_ATTRIBUTE)
}

/// Whether a path contributes to the document-level match
fn routes_to_match(c: &ClassifiedPath<'_>) -> bool {
    match c.parent {
        ParentKind::Other => true,
        ParentKind::EmbeddedList => c.spec.is_matching,
        ParentKind::Label(_) => c.spec.is_matching && !prunes_keypoints(c),
    }
}

/// Builds the single match stage, or `None` if no path contributes
pub fn build_match_stage(ctx: &FilterContext<'_>, filters: &Filters) -> FilterResult<Option<Stage>> {
    let mut conditions = Vec::new();

    let scalar = classify_scalar_paths(ctx.catalog, filters)?;
    let labels = classify_label_paths(ctx.catalog, filters)?;
    let mut paths: Vec<&ClassifiedPath<'_>> = scalar.iter().chain(labels.iter()).collect();
    paths.sort_by(|a, b| a.path.cmp(b.path));

    for c in paths.into_iter().filter(|c| routes_to_match(c)) {
        let db_path = ctx.catalog.db_path(c.path);
        conditions.push(build_query(&db_path, &c.field.kind, c.spec)?);
    }

    if conditions.is_empty() {
        return Ok(None);
    }
    Ok(Some(Stage::match_query(&Query::and(conditions))))
}

/// Builds one set-field stage per filtered path inside a plain embedded list
pub fn build_field_filter_stages(
    ctx: &FilterContext<'_>,
    filters: &Filters,
) -> FilterResult<Vec<Stage>> {
    let mut stages = Vec::new();
    for c in classify_scalar_paths(ctx.catalog, filters)? {
        if c.parent != ParentKind::EmbeddedList || c.spec.is_matching {
            continue;
        }
        let element = Expr::this_field(c.field.db_field.as_str());
        let predicate = build_expr(c.path, element, &c.field.kind, c.spec, false)?;
        let list = Expr::field(ctx.catalog.db_path(&c.parent_path))
            .if_null(Expr::empty_array())
            .filter(predicate);
        stages.push(Stage::set_field(c.parent_path.as_str(), &list));
    }
    Ok(stages)
}

/// Builds one label-pruning stage per filtered label attribute
pub fn build_label_filter_stages(
    ctx: &FilterContext<'_>,
    filters: &Filters,
) -> FilterResult<Vec<Stage>> {
    let mut stages = Vec::new();
    for c in classify_label_paths(ctx.catalog, filters)? {
        if prunes_keypoints(&c) {
            stages.push(build_keypoint_stage(&c.parent_path, c.field, c.spec, ctx.skeletons)?);
            continue;
        }
        if c.spec.is_matching {
            continue;
        }
        let label = Expr::this_field(c.field.db_field.as_str());
        let predicate = build_expr(c.path, label, &c.field.kind, c.spec, false)?;
        let only_matches = !c.spec.exclude || ctx.exclude_drops_empty;
        stages.push(Stage::filter_labels(c.parent_path.as_str(), &predicate, only_matches));
    }
    Ok(stages)
}

/// Match, field filter and label filter stages, in that order
pub fn make_filter_stages(ctx: &FilterContext<'_>, filters: &Filters) -> FilterResult<Vec<Stage>> {
    let mut stages = Vec::new();
    if let Some(stage) = build_match_stage(ctx, filters)? {
        stages.push(stage);
    }
    stages.extend(build_field_filter_stages(ctx, filters)?);
    stages.extend(build_label_filter_stages(ctx, filters)?);
    Ok(stages)
}
