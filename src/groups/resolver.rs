//! Group filter resolution
//!
//! | filter         | stage-list effect                                            |
//! |----------------|--------------------------------------------------------------|
//! | nothing        | none                                                         |
//! | `slice`        | active slice only                                            |
//! | `id`           | optimized select of the group                                |
//! | `slices`       | flatten across slices (or slice-membership match if already selected) |
//! | `id`+`slices`  | flatten, match group id, replay non-selecting stages         |

use std::collections::BTreeSet;

use crate::expr::{Literal, Query, QueryOp};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::MediaType;
use crate::stages::Stage;
use crate::view::{GroupFilter, View, ViewError, ViewResult};

use super::select::make_optimized_select_view;

/// Match keeping documents whose group slice is one of `slices`
fn slice_membership(group_field: &str, slices: &[String]) -> Stage {
    let names = slices.iter().map(|s| Literal::String(s.clone())).collect();
    Stage::match_query(&Query::field(
        format!("{}.name", group_field),
        QueryOp::In(names),
    ))
}

/// Applies `filter` to `view`, returning the narrowed view and the media
/// types it can contain (`None` when nothing was resolved)
pub fn resolve_group_filter(
    view: View,
    filter: &GroupFilter,
) -> ViewResult<(View, Option<BTreeSet<MediaType>>)> {
    if filter.is_empty() {
        return Ok((view, None));
    }

    let dataset = view.dataset().clone();
    let group_field = dataset
        .group_field
        .as_deref()
        .ok_or_else(|| ViewError::NotGrouped {
            dataset: dataset.name.clone(),
        })?;
    let group_key = format!("{}.id", group_field);

    let unselected = !view.stages().iter().any(Stage::selects_group_slices);
    let group_by = view.stages().iter().any(|s| s.groups_by(&group_key));

    let mut view = view;
    if let Some(slice) = &filter.slice {
        view.set_group_slice(Some(slice.clone()));
    }

    let mut flattened = false;
    match (&filter.slices, &filter.id) {
        (Some(slices), id) if unselected => {
            let mut out = view.base();
            out.add_stage(Stage::select_group_slices(Some(slices.clone()), true));
            if let Some(id) = id {
                out.add_stage(Stage::select_by_ids(format!("{}._id", group_field), &[id])?);
            }
            for stage in view.stages() {
                // A group id match already pins the result
                if id.is_some() && stage.reorders_or_selects() {
                    continue;
                }
                if group_by && stage.groups_by(&group_key) {
                    out.add_stage(slice_membership(group_field, slices));
                }
                out.add_stage(stage.clone());
            }
            view = out;
            flattened = true;
        }
        (_, Some(id)) => {
            view = make_optimized_select_view(&view, &[id], true)?;
        }
        _ => {}
    }

    if let (false, false, Some(slices)) = (group_by, flattened, &filter.slices) {
        view.add_stage(slice_membership(group_field, slices));
    }

    let media_types: BTreeSet<MediaType> = match &filter.slices {
        Some(slices) => slices
            .iter()
            .filter_map(|s| dataset.group_media_types.get(s))
            .copied()
            .collect(),
        None => dataset.group_media_types.values().copied().collect(),
    };

    let stage_count = view.stages().len().to_string();
    log_event_with_fields(
        Event::GroupFilterResolved,
        &[
            ("dataset", dataset.name.as_str()),
            ("flattened", if flattened { "true" } else { "false" }),
            ("slice", view.group_slice().unwrap_or("")),
            ("stages", stage_count.as_str()),
        ],
    );

    Ok((view, Some(media_types)))
}
