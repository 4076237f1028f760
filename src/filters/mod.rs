//! Filter compiler
//!
//! Compiles the client's per-path `FilterSpec`s into view stages.
//!
//! # Design Principles
//!
//! - Pure: no I/O, no mutation of the schema, deterministic output
//! - Every path is routed to exactly one assembler (match, field filter or
//!   label filter)
//! - Unsupported combinations fail with the offending path named
//!
//! # Routing
//!
//! | parent                 | `isMatching` | assembler              |
//! |------------------------|--------------|------------------------|
//! | none / scalar / dict   | any          | match                  |
//! | list of embedded docs  | true         | match                  |
//! | list of embedded docs  | false        | field filter           |
//! | label                  | true         | match                  |
//! | label                  | false        | label filter           |
//! | keypoint parallel list | any          | keypoint filter        |

mod assemble;
mod classify;
mod errors;
mod expression;
mod keypoints;
mod scalar;
mod spec;

pub use assemble::{
    build_field_filter_stages, build_label_filter_stages, build_match_stage, make_filter_stages,
    FilterContext,
};
pub use classify::{
    classify_label_paths, classify_scalar_paths, is_reserved_path, ClassifiedPath, ParentKind,
    TAGS_PATH,
};
pub use errors::{FilterError, FilterResult};
pub use expression::build_expr;
pub use keypoints::{build_keypoint_stage, is_parallel_attribute, POINTS_ATTRIBUTE};
pub use scalar::build_query;
pub use spec::{FilterSpec, Filters, Sentinel};
