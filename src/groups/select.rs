//! Id selection that keeps prior stages meaningful
//!
//! Selecting first and replaying the view is cheaper for the executor, but
//! only valid when no existing stage drops or reorders documents; otherwise
//! the select goes last.

use crate::stages::Stage;
use crate::view::{View, ViewError, ViewResult};

/// Selects `ids` (sample ids, or group ids if `groups`) within `view`
pub fn make_optimized_select_view<S: AsRef<str>>(
    view: &View,
    ids: &[S],
    groups: bool,
) -> ViewResult<View> {
    let select = if groups {
        let dataset = view.dataset();
        let group_field = dataset
            .group_field
            .as_deref()
            .ok_or_else(|| ViewError::NotGrouped {
                dataset: dataset.name.clone(),
            })?;
        Stage::select_by_ids(format!("{}._id", group_field), ids)?
    } else {
        Stage::select(ids, false)?
    };

    if view.stages().iter().any(Stage::reorders_or_selects) {
        let mut out = view.clone();
        out.add_stage(select);
        return Ok(out);
    }

    let mut out = view.base();
    out.add_stage(select);
    out.extend_stages(view.stages().iter().cloned());
    Ok(out)
}
