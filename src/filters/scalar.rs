//! Document-level predicates
//!
//! Builds one `Query` per filtered path. Pure: no lookups beyond the field
//! kind handed in, no mutation.
//!
//! Dispatch by kind:
//!
//! | kind                          | keys                      | condition                         |
//! |-------------------------------|---------------------------|-----------------------------------|
//! | int/float/date/frame support  | `range`                   | `>=min AND <=max` / `<min OR >max`|
//! | int/float/date/frame support  | sentinels only            | `!=` / `==` each unset sentinel   |
//! | string/object id              | `values`                  | `$in` / `$nin`                    |
//! | string                        | `search`                  | case-insensitive regex            |
//! | bool                          | `true` / `false`          | four-way table                    |
//!
//! Anything else is a contract violation and fails.

use chrono::{TimeZone, Utc};

use crate::expr::{Expr, Literal, ObjectId, Query, QueryOp};
use crate::schema::FieldKind;

use super::errors::{FilterError, FilterResult};
use super::spec::{FilterSpec, Sentinel};

/// Literal for a sentinel marker
pub(crate) fn sentinel_literal(sentinel: Sentinel) -> Literal {
    match sentinel {
        Sentinel::Nan => Literal::nan(),
        Sentinel::Inf => Literal::inf(),
        Sentinel::Ninf => Literal::ninf(),
        Sentinel::None => Literal::Null,
    }
}

/// Converts a range bound to a literal of the field's kind.
///
/// Temporal bounds arrive as millisecond timestamps.
pub(crate) fn bound_literal(path: &str, kind: &FieldKind, value: f64) -> FilterResult<Literal> {
    if kind.is_temporal() {
        let invalid = || FilterError::InvalidTimestamp {
            path: path.to_string(),
            value,
        };
        if !value.is_finite() {
            return Err(invalid());
        }
        let dt = Utc
            .timestamp_millis_opt(value as i64)
            .single()
            .ok_or_else(invalid)?;
        return Ok(Literal::DateTime(dt));
    }
    match kind {
        FieldKind::Float => Ok(Literal::Float(value)),
        _ => Ok(Literal::from_number(value)),
    }
}

/// Value literals for a string/id filter; `null` entries become `Null`
pub(crate) fn value_literals(kind: &FieldKind, spec: &FilterSpec) -> FilterResult<Vec<Literal>> {
    let mut out = Vec::new();
    for value in spec.present_values() {
        out.push(match kind {
            FieldKind::ObjectId => Literal::ObjectId(ObjectId::parse(&value)?),
            _ => Literal::String(value),
        });
    }
    if spec.wants_none() {
        out.push(Literal::Null);
    }
    Ok(out)
}

/// Regex matching `text` anywhere, with metacharacters escaped
pub(crate) fn search_pattern(text: &str) -> String {
    regex::escape(text)
}

/// Builds the document-level condition for `path` (a storage path)
pub fn build_query(path: &str, kind: &FieldKind, spec: &FilterSpec) -> FilterResult<Query> {
    // Lists are matched element-wise by the executor
    let kind = match kind {
        FieldKind::List { element } => element.as_ref(),
        other => other,
    };

    match kind {
        FieldKind::Int
        | FieldKind::Float
        | FieldKind::Date
        | FieldKind::DateTime
        | FieldKind::FrameSupport => numeric_query(path, kind, spec),
        FieldKind::String | FieldKind::ObjectId => values_query(path, kind, spec),
        FieldKind::Bool => Ok(bool_query(path, spec)),
        FieldKind::Dict
        | FieldKind::Embedded
        | FieldKind::Label { .. }
        | FieldKind::List { .. } => Err(FilterError::unsupported(
            path,
            kind.type_name(),
            "field kind cannot be filtered",
        )),
    }
}

fn numeric_query(path: &str, kind: &FieldKind, spec: &FilterSpec) -> FilterResult<Query> {
    if let Some([min, max]) = spec.range {
        let min = bound_literal(path, kind, min)?;
        let max = bound_literal(path, kind, max)?;
        let set: Vec<Literal> = spec
            .set_sentinels()
            .into_iter()
            .map(sentinel_literal)
            .collect();

        if spec.exclude {
            let outside = Query::Or(vec![
                Query::field(path, QueryOp::Lt(min)),
                Query::field(path, QueryOp::Gt(max)),
            ]);
            if set.is_empty() {
                return Ok(outside);
            }
            return Ok(Query::And(vec![outside, Query::field(path, QueryOp::Nin(set))]));
        }

        let inside = Query::And(vec![
            Query::field(path, QueryOp::Gte(min)),
            Query::field(path, QueryOp::Lte(max)),
        ]);
        if set.is_empty() {
            return Ok(inside);
        }
        return Ok(Query::Or(vec![inside, Query::field(path, QueryOp::In(set))]));
    }

    if spec.has_sentinels() {
        // Inclusion keeps everything except the sentinels left unset;
        // exclusion requires equality with every unset sentinel.
        let conditions: Vec<Query> = spec
            .unset_sentinels()
            .into_iter()
            .map(|s| {
                let lit = sentinel_literal(s);
                if spec.exclude {
                    Query::field(path, QueryOp::Eq(lit))
                } else {
                    Query::field(path, QueryOp::Ne(lit))
                }
            })
            .collect();
        if conditions.is_empty() {
            return Ok(Query::Expr(Expr::lit(true)));
        }
        return Ok(Query::and(conditions));
    }

    Err(FilterError::unsupported(
        path,
        kind.type_name(),
        "numeric filters need a range or non-finite flags",
    ))
}

fn values_query(path: &str, kind: &FieldKind, spec: &FilterSpec) -> FilterResult<Query> {
    if spec.values.is_some() {
        let values = value_literals(kind, spec)?;
        let op = if spec.exclude {
            QueryOp::Nin(values)
        } else {
            QueryOp::In(values)
        };
        return Ok(Query::field(path, op));
    }

    if let (Some(text), FieldKind::String) = (&spec.search, kind) {
        let q = Query::field(path, QueryOp::Regex(search_pattern(text)));
        return Ok(if spec.exclude { Query::not(q) } else { q });
    }

    Err(FilterError::unsupported(
        path,
        kind.type_name(),
        "value filters need `values` (or `search` on strings)",
    ))
}

fn bool_query(path: &str, spec: &FilterSpec) -> Query {
    let t = spec.include_true.unwrap_or(false);
    let f = spec.include_false.unwrap_or(false);
    let both = || vec![Literal::Bool(true), Literal::Bool(false)];
    match (t, f) {
        (true, true) => Query::field(path, QueryOp::In(both())),
        (false, true) => Query::field(path, QueryOp::Eq(Literal::Bool(false))),
        (true, false) => Query::field(path, QueryOp::Eq(Literal::Bool(true))),
        (false, false) => Query::field(path, QueryOp::Nin(both())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_range_inclusive() {
        let q = build_query("n", &FieldKind::Int, &FilterSpec::range(5.0, 15.0)).unwrap();
        assert_eq!(
            q.to_json(),
            json!({"$and": [{"n": {"$gte": 5}}, {"n": {"$lte": 15}}]})
        );
    }

    #[test]
    fn test_range_exclude_is_strict() {
        let q = build_query("n", &FieldKind::Int, &FilterSpec::range(5.0, 15.0).excluded()).unwrap();
        assert_eq!(q.to_json(), json!({"$or": [{"n": {"$lt": 5}}, {"n": {"$gt": 15}}]}));
    }

    #[test]
    fn test_range_with_set_sentinel() {
        let spec = FilterSpec::range(0.0, 1.0).with_sentinel(Sentinel::Nan, true);
        let q = build_query("c", &FieldKind::Float, &spec).unwrap();
        assert_eq!(
            q.to_json(),
            json!({"$or": [
                {"$and": [{"c": {"$gte": 0.0}}, {"c": {"$lte": 1.0}}]},
                {"c": {"$in": [{"$numberDouble": "NaN"}]}},
            ]})
        );
    }

    #[test]
    fn test_sentinels_only_include() {
        let spec = FilterSpec::new()
            .with_sentinel(Sentinel::Nan, true)
            .with_sentinel(Sentinel::Inf, false)
            .with_sentinel(Sentinel::Ninf, false)
            .with_sentinel(Sentinel::None, false);
        let q = build_query("c", &FieldKind::Float, &spec).unwrap();
        assert_eq!(
            q.to_json(),
            json!({"$and": [
                {"c": {"$ne": {"$numberDouble": "Infinity"}}},
                {"c": {"$ne": {"$numberDouble": "-Infinity"}}},
                {"c": {"$ne": null}},
            ]})
        );
    }

    #[test]
    fn test_sentinels_only_exclude() {
        let spec = FilterSpec::new()
            .with_sentinel(Sentinel::Nan, true)
            .with_sentinel(Sentinel::Inf, true)
            .with_sentinel(Sentinel::Ninf, true)
            .with_sentinel(Sentinel::None, false)
            .excluded();
        let q = build_query("c", &FieldKind::Float, &spec).unwrap();
        assert_eq!(q.to_json(), json!({"c": {"$eq": null}}));
    }

    #[test]
    fn test_dates_use_datetimes() {
        let q = build_query("d", &FieldKind::DateTime, &FilterSpec::range(0.0, 86_400_000.0))
            .unwrap();
        assert_eq!(
            q.to_json(),
            json!({"$and": [
                {"d": {"$gte": {"$date": "1970-01-01T00:00:00.000Z"}}},
                {"d": {"$lte": {"$date": "1970-01-02T00:00:00.000Z"}}},
            ]})
        );
    }

    #[test]
    fn test_object_ids_parsed() {
        let spec = FilterSpec::values(["64b7f0c2a1b2c3d4e5f60718"]).excluded();
        let q = build_query("_id", &FieldKind::ObjectId, &spec).unwrap();
        assert_eq!(
            q.to_json(),
            json!({"_id": {"$nin": [{"$oid": "64b7f0c2a1b2c3d4e5f60718"}]}})
        );

        let bad = FilterSpec::values(["nope"]);
        let err = build_query("_id", &FieldKind::ObjectId, &bad).unwrap_err();
        assert_eq!(err.code(), "AERO_VIEW_INVALID_ID");
    }

    #[test]
    fn test_string_values_with_none() {
        let spec = FilterSpec::values(["cat"]).with_none_value();
        let q = build_query("l", &FieldKind::list(FieldKind::String), &spec).unwrap();
        assert_eq!(q.to_json(), json!({"l": {"$in": ["cat", null]}}));
    }

    #[test]
    fn test_search_escapes() {
        let q = build_query("s", &FieldKind::String, &FilterSpec::search("a.b")).unwrap();
        assert_eq!(q.to_json(), json!({"s": {"$regex": "a\\.b", "$options": "i"}}));
    }

    #[test]
    fn test_bool_table() {
        let cases = [
            ((true, true), json!({"b": {"$in": [true, false]}})),
            ((false, true), json!({"b": {"$eq": false}})),
            ((true, false), json!({"b": {"$eq": true}})),
            ((false, false), json!({"b": {"$nin": [true, false]}})),
        ];
        for ((t, f), expected) in cases {
            let q = build_query("b", &FieldKind::Bool, &FilterSpec::booleans(t, f)).unwrap();
            assert_eq!(q.to_json(), expected);
        }
    }

    #[test]
    fn test_other_combinations_fail() {
        let err = build_query("n", &FieldKind::Int, &FilterSpec::values(["1"])).unwrap_err();
        assert_eq!(err.code(), "AERO_VIEW_UNSUPPORTED_FILTER");

        let err = build_query("m", &FieldKind::Dict, &FilterSpec::range(0.0, 1.0)).unwrap_err();
        assert_eq!(err.path(), Some("m"));
    }
}
