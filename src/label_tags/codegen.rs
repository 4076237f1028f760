//! Label-tag aggregation stages
//!
//! `_label_tags` is built in two passes: first every label field's tags are
//! folded into one flat list, then (for display) the list is turned into a
//! `tag -> count` object with a per-document map over its distinct values.

use crate::expr::Expr;
use crate::stages::Stage;

use super::traversal::{TagLevel, TagSource};

/// Synthetic, non-persisted field holding the aggregated tags
pub const LABEL_TAGS_FIELD: &str = "_label_tags";

/// Top-level array holding a video's frames
pub const FRAMES_FIELD: &str = "frames";

fn tags_of(element: Expr) -> Expr {
    element.child("tags").if_null(Expr::empty_array())
}

/// `$$value ++ ($$this.<rel>.tags ?? [])`, folded over `input`
fn fold_tags(input: Expr, element: Expr) -> Expr {
    input
        .if_null(Expr::empty_array())
        .reduce(Expr::var("value").extend(element), Expr::empty_array())
}

/// Tags contributed by one label field, as a flat list
pub fn source_tags_expr(source: &TagSource) -> Expr {
    match (source.level, source.list_attribute) {
        (TagLevel::Sample, None) => tags_of(Expr::field(source.db_path.as_str())),
        (TagLevel::Sample, Some(attr)) => fold_tags(
            Expr::field(format!("{}.{}", source.db_path, attr)),
            tags_of(Expr::this()),
        ),
        (TagLevel::Frame, None) => fold_tags(
            Expr::field(FRAMES_FIELD),
            tags_of(Expr::this_field(source.db_path.as_str())),
        ),
        (TagLevel::Frame, Some(attr)) => fold_tags(
            Expr::field(FRAMES_FIELD),
            fold_tags(
                Expr::this_field(format!("{}.{}", source.db_path, attr)),
                tags_of(Expr::this()),
            ),
        ),
    }
}

/// Stages that set `_label_tags` to the flat list of every label's tags
pub fn label_tags_stages(sources: &[TagSource]) -> Vec<Stage> {
    let mut stages = vec![Stage::set_field(LABEL_TAGS_FIELD, &Expr::empty_array())];
    for source in sources {
        let extended = Expr::field(LABEL_TAGS_FIELD).extend(source_tags_expr(source));
        stages.push(Stage::set_field(LABEL_TAGS_FIELD, &extended));
    }
    stages
}

/// Expression turning the flat tag list into a `tag -> count` object
pub fn tag_counts_expr() -> Expr {
    let tags = Expr::field(LABEL_TAGS_FIELD);
    let count = tags
        .clone()
        .filter(Expr::this().eq(Expr::var("tag")))
        .size();
    let pair = Expr::Object(vec![
        ("k".to_string(), Expr::var("tag")),
        ("v".to_string(), count),
    ]);
    Expr::ArrayToObject(Box::new(Expr::SetUnion(Box::new(tags)).map("tag", pair)))
}

/// Aggregation followed by the count transform
pub fn label_tag_count_stages(sources: &[TagSource]) -> Vec<Stage> {
    let mut stages = label_tags_stages(sources);
    stages.push(Stage::set_field(LABEL_TAGS_FIELD, &tag_counts_expr()));
    stages
}
