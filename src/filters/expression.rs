//! Element-level predicates
//!
//! Same dispatch as the document-level builder, but the result is an `Expr`
//! evaluated against one element (a label, an embedded document, a list
//! item). Lists recurse into their element kind and test the length of the
//! filtered sublist.
//!
//! `is_matching` suppresses the final `exclude` negation: in matching mode
//! the predicate decides whether a document is kept, never which elements
//! are pruned.

use crate::expr::{Expr, Literal};
use crate::schema::FieldKind;

use super::errors::{FilterError, FilterResult};
use super::scalar::{bound_literal, search_pattern, sentinel_literal, value_literals};
use super::spec::{FilterSpec, Sentinel};

/// Builds the element-level predicate for the value `f` of kind `kind`
pub fn build_expr(
    path: &str,
    f: Expr,
    kind: &FieldKind,
    spec: &FilterSpec,
    is_matching: bool,
) -> FilterResult<Expr> {
    match kind {
        FieldKind::List { element } => {
            let inner = build_expr(path, Expr::this(), element, &spec.without_exclude(), is_matching)?;
            let matched = f.if_null(Expr::empty_array()).filter(inner).size();
            Ok(if spec.exclude {
                matched.eq(Expr::lit(0i64))
            } else {
                matched.gt(Expr::lit(0i64))
            })
        }
        FieldKind::Bool => Ok(bool_expr(f, spec)),
        FieldKind::FrameSupport => {
            let range = match spec.range {
                Some([min, max]) => Some(
                    f.clone()
                        .at(0)
                        .gte(Expr::Literal(bound_literal(path, kind, min)?))
                        .and(f.clone().at(1).lte(Expr::Literal(bound_literal(path, kind, max)?))),
                ),
                None => None,
            };
            numeric_expr(path, f, kind, range, spec, is_matching)
        }
        FieldKind::Int | FieldKind::Float | FieldKind::Date | FieldKind::DateTime => {
            let range = match spec.range {
                Some([min, max]) => Some(
                    f.clone()
                        .gte(Expr::Literal(bound_literal(path, kind, min)?))
                        .and(f.clone().lte(Expr::Literal(bound_literal(path, kind, max)?))),
                ),
                None => None,
            };
            numeric_expr(path, f, kind, range, spec, is_matching)
        }
        FieldKind::String | FieldKind::ObjectId => values_expr(path, f, kind, spec, is_matching),
        FieldKind::Dict | FieldKind::Embedded | FieldKind::Label { .. } => Err(
            FilterError::unsupported(path, kind.type_name(), "field kind cannot be filtered"),
        ),
    }
}

/// The four-way boolean table, evaluated per element
pub(crate) fn bool_expr(f: Expr, spec: &FilterSpec) -> Expr {
    let t = spec.include_true.unwrap_or(false);
    let fl = spec.include_false.unwrap_or(false);
    match (t, fl) {
        (true, true) => f.is_in(vec![Literal::Bool(true), Literal::Bool(false)]),
        (false, true) => f.eq(Expr::lit(false)),
        (true, false) => f.eq(Expr::lit(true)),
        (false, false) => f
            .clone()
            .ne(Expr::lit(true))
            .and(f.ne(Expr::lit(false))),
    }
}

/// Tests `f` against a sentinel; `None` means "missing or null"
fn sentinel_test(f: &Expr, sentinel: Sentinel, equal: bool) -> Expr {
    match (sentinel, equal) {
        (Sentinel::None, true) => f.clone().exists().not(),
        (Sentinel::None, false) => f.clone().exists(),
        (s, true) => f.clone().eq(Expr::Literal(sentinel_literal(s))),
        (s, false) => f.clone().ne(Expr::Literal(sentinel_literal(s))),
    }
}

fn numeric_expr(
    path: &str,
    f: Expr,
    kind: &FieldKind,
    range: Option<Expr>,
    spec: &FilterSpec,
    is_matching: bool,
) -> FilterResult<Expr> {
    let Some(mut expr) = range else {
        if !spec.has_sentinels() {
            return Err(FilterError::unsupported(
                path,
                kind.type_name(),
                "numeric filters need a range or non-finite flags",
            ));
        }
        // Same table as the document-level builder; exclusion is encoded in
        // the table itself.
        let mut tests: Vec<Expr> = spec
            .unset_sentinels()
            .into_iter()
            .map(|s| sentinel_test(&f, s, spec.exclude))
            .collect();
        return Ok(match tests.len() {
            0 => Expr::lit(true),
            1 => tests.remove(0),
            _ => Expr::And(tests),
        });
    };

    let finite: Vec<Literal> = spec
        .set_sentinels()
        .into_iter()
        .filter(|s| *s != Sentinel::None)
        .map(sentinel_literal)
        .collect();
    if !finite.is_empty() {
        expr = expr.or(f.clone().is_in(finite));
    }
    if spec.none == Some(true) {
        expr = expr.or(f.exists().not());
    }

    if spec.exclude && !is_matching {
        expr = expr.not();
    }
    Ok(expr)
}

fn values_expr(
    path: &str,
    f: Expr,
    kind: &FieldKind,
    spec: &FilterSpec,
    is_matching: bool,
) -> FilterResult<Expr> {
    let negate = spec.exclude && !is_matching;

    let mut expr = if spec.values.is_some() {
        let values: Vec<Literal> = value_literals(kind, spec)?
            .into_iter()
            .filter(|v| !v.is_null())
            .collect();
        f.clone().is_in(values)
    } else if let (Some(text), FieldKind::String) = (&spec.search, kind) {
        f.clone().regex_match(search_pattern(text))
    } else {
        return Err(FilterError::unsupported(
            path,
            kind.type_name(),
            "value filters need `values` (or `search` on strings)",
        ));
    };

    if negate {
        expr = expr.not();
    }
    if spec.wants_none() {
        expr = if spec.exclude {
            expr.and(f.exists())
        } else {
            expr.or(f.exists().not())
        };
    }
    Ok(expr)
}
