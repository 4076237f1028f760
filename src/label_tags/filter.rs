//! Filtering on `_label_tags`
//!
//! The synthetic field does not exist in storage, so a filter on it is
//! rewritten against every label field's real `tags` array.

use crate::expr::{Expr, Literal, Query, QueryOp};
use crate::filters::{build_expr, FilterError, FilterResult, FilterSpec};
use crate::schema::FieldKind;
use crate::stages::Stage;

use super::codegen::LABEL_TAGS_FIELD;
use super::traversal::TagSource;

/// Document-level condition: any label field holds one of `values`
fn any_label_tagged(sources: &[TagSource], values: &[String]) -> Query {
    let literals: Vec<Literal> = values.iter().map(|v| Literal::String(v.clone())).collect();
    Query::or(
        sources
            .iter()
            .map(|s| Query::field(s.tags_path(), QueryOp::In(literals.clone())))
            .collect(),
    )
}

/// Stages implementing a `_label_tags` filter.
///
/// Inclusion (and any matching-mode filter) narrows documents with one match
/// stage; pruning mode additionally filters the labels of every field.
pub fn label_tags_filter_stages(
    sources: &[TagSource],
    spec: &FilterSpec,
) -> FilterResult<Vec<Stage>> {
    let values = spec.present_values();
    if spec.values.is_none() {
        return Err(FilterError::unsupported(
            LABEL_TAGS_FIELD,
            "list",
            "label tag filters need `values`",
        ));
    }
    if sources.is_empty() {
        // No document can hold a label tag: inclusion keeps nothing,
        // exclusion keeps everything
        if spec.exclude {
            return Ok(Vec::new());
        }
        return Ok(vec![Stage::match_query(&Query::Expr(Expr::lit(false)))]);
    }

    let mut stages = Vec::new();

    if !spec.exclude || spec.is_matching {
        let query = any_label_tagged(sources, &values);
        let query = if spec.exclude { Query::not(query) } else { query };
        stages.push(Stage::match_query(&query));
    }

    if !spec.is_matching {
        let kind = FieldKind::list(FieldKind::String);
        let element = FilterSpec::values(values.iter().cloned());
        let element = if spec.exclude { element.excluded() } else { element };
        let predicate = build_expr(LABEL_TAGS_FIELD, Expr::this_field("tags"), &kind, &element, false)?;
        for source in sources {
            stages.push(Stage::filter_labels(source.path.as_str(), &predicate, false));
        }
    }

    Ok(stages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label_tags::traversal::TagLevel;
    use serde_json::json;

    fn sources() -> Vec<TagSource> {
        vec![
            TagSource {
                path: "cls".into(),
                db_path: "cls".into(),
                level: TagLevel::Sample,
                list_attribute: None,
            },
            TagSource {
                path: "gt".into(),
                db_path: "gt".into(),
                level: TagLevel::Sample,
                list_attribute: Some("detections"),
            },
        ]
    }

    #[test]
    fn test_include_matches_then_prunes() {
        let stages = label_tags_filter_stages(&sources(), &FilterSpec::values(["ok"])).unwrap();
        assert_eq!(
            stages[0],
            Stage::Match {
                filter: json!({"$or": [
                    {"cls.tags": {"$in": ["ok"]}},
                    {"gt.detections.tags": {"$in": ["ok"]}},
                ]})
            }
        );
        let names: Vec<&str> = stages.iter().map(Stage::name).collect();
        assert_eq!(names, vec!["Match", "FilterLabels", "FilterLabels"]);
    }

    #[test]
    fn test_exclude_only_prunes() {
        let spec = FilterSpec::values(["bad"]).excluded();
        let stages = label_tags_filter_stages(&sources(), &spec).unwrap();
        assert_eq!(stages.len(), 2);
        match &stages[0] {
            Stage::FilterLabels { filter, only_matches, .. } => {
                assert!(!only_matches);
                assert_eq!(filter["$eq"][1], json!(0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_matching_exclude_negates_match() {
        let spec = FilterSpec::values(["bad"]).excluded().matching();
        let stages = label_tags_filter_stages(&sources(), &spec).unwrap();
        assert_eq!(stages.len(), 1);
        match &stages[0] {
            Stage::Match { filter } => assert!(filter.get("$nor").is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_include_without_label_fields_keeps_nothing() {
        for spec in [FilterSpec::values(["a"]), FilterSpec::values(["a"]).matching()] {
            let stages = label_tags_filter_stages(&[], &spec).unwrap();
            assert_eq!(stages, vec![Stage::Match { filter: json!({"$expr": false}) }]);
        }
    }

    #[test]
    fn test_exclude_without_label_fields_is_noop() {
        let spec = FilterSpec::values(["a"]).excluded();
        assert!(label_tags_filter_stages(&[], &spec).unwrap().is_empty());
        assert!(label_tags_filter_stages(&[], &spec.matching()).unwrap().is_empty());
    }

    #[test]
    fn test_values_required() {
        let err = label_tags_filter_stages(&sources(), &FilterSpec::range(0.0, 1.0)).unwrap_err();
        assert_eq!(err.code(), "AERO_VIEW_UNSUPPORTED_FILTER");
    }
}
