//! aeroview - compiles declarative filter requests into view stage pipelines
//!
//! A client sends per-path filters, extended stages and group selections;
//! the compiler turns them into an ordered list of stages for an external
//! aggregation engine. Nothing is executed here.

pub mod cli;
pub mod expr;
pub mod filters;
pub mod groups;
pub mod label_tags;
pub mod observability;
pub mod schema;
pub mod stages;
pub mod view;

pub use filters::{FilterSpec, Filters};
pub use view::{CompiledView, CompilerConfig, View, ViewCompiler, ViewError, ViewRequest};
