//! Group and slice resolution
//!
//! Grouped datasets hold several samples (slices) per group. A group filter
//! picks the active slice, flattens across slices, or pins one group, and
//! reports which media types the result can contain.
//!
//! # Design Principles
//!
//! - Deterministic: the same view and filter give the same stage list
//! - Stage replay consults `Stage::reorders_or_selects`, never a local list
//! - Malformed ids propagate as errors

mod resolver;
mod select;

pub use resolver::resolve_group_filter;
pub use select::make_optimized_select_view;
