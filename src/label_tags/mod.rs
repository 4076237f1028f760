//! Label-tag aggregation
//!
//! Tags live on individual labels spread over many fields and levels. This
//! subsystem folds them into the synthetic `_label_tags` field (flat list,
//! then `tag -> count` for display) and rewrites filters on that field
//! against the real tag arrays.
//!
//! # Design Principles
//!
//! - Field traversal is separate from expression generation
//! - Aggregation is a per-document fold, never a collection-wide group
//! - Missing or null tag arrays contribute nothing

mod codegen;
mod filter;
mod traversal;

pub use codegen::{
    label_tag_count_stages, label_tags_stages, source_tags_expr, tag_counts_expr, FRAMES_FIELD,
    LABEL_TAGS_FIELD,
};
pub use filter::label_tags_filter_stages;
pub use traversal::{label_tag_sources, TagLevel, TagSource};
