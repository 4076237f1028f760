//! Keypoint parallel-array filters
//!
//! A keypoint label stores one entry per skeleton point in each of its list
//! attributes (`points`, `confidence`, custom per-point lists). Filtering
//! those lists prunes points, not labels, so it gets its own stage.

use crate::expr::Expr;
use crate::schema::{FieldKind, FieldSpec, LabelKind, SkeletonRegistry};
use crate::stages::Stage;

use super::errors::{FilterError, FilterResult};
use super::expression::bool_expr;
use super::scalar::bound_literal;
use super::spec::FilterSpec;

/// Attribute holding the point coordinates
pub const POINTS_ATTRIBUTE: &str = "points";

/// Whether `field` is a per-point parallel array of a keypoint label
pub fn is_parallel_attribute(label: LabelKind, field: &FieldSpec) -> bool {
    label.is_keypoints() && matches!(field.kind, FieldKind::List { .. }) && field.name() != "tags"
}

/// Builds the point-pruning stage for a parallel attribute of `label_path`
pub fn build_keypoint_stage(
    label_path: &str,
    field: &FieldSpec,
    spec: &FilterSpec,
    skeletons: &SkeletonRegistry,
) -> FilterResult<Stage> {
    if field.name() == POINTS_ATTRIBUTE {
        let skeleton = skeletons
            .get(label_path)
            .ok_or_else(|| FilterError::MissingSkeleton {
                path: label_path.to_string(),
            })?;
        let values = spec.present_values();
        let labels = if spec.exclude {
            skeleton.complement(&values)
        } else {
            values
        };
        return Ok(Stage::filter_keypoints_by_label(label_path, labels));
    }

    let element = field.kind.element().unwrap_or(&field.kind);
    let point = Expr::this_field(field.db_field.as_str());

    let expr = match element {
        FieldKind::Bool => bool_expr(point, spec),
        FieldKind::Float | FieldKind::Int => {
            let [min, max] = spec.range.ok_or_else(|| {
                FilterError::unsupported(
                    field.path.as_str(),
                    element.type_name(),
                    "numeric keypoint attributes need a range",
                )
            })?;
            let range = point
                .clone()
                .gte(Expr::Literal(bound_literal(&field.path, element, min)?))
                .and(point.lte(Expr::Literal(bound_literal(&field.path, element, max)?)));
            if spec.exclude {
                range.not()
            } else {
                range
            }
        }
        other => {
            return Err(FilterError::UnsupportedKeypointAttribute {
                path: field.path.clone(),
                kind: other.type_name(),
            })
        }
    };

    Ok(Stage::filter_keypoints(label_path, &expr))
}
