//! View construction
//!
//! Entry point of the compiler: resolves a dataset, rebuilds the requested
//! base view, applies sample and group filters, then appends extended,
//! projection and filter stages in a fixed order.
//!
//! # Design Principles
//!
//! - Building a view does no I/O beyond resolving the dataset
//! - Each build owns its `View`; datasets and schemas are shared read-only
//! - Stage order is part of the contract
//! - Saved views are returned exactly as stored

mod builder;
mod config;
mod dataset;
mod errors;
mod request;
#[allow(clippy::module_inception)]
mod view;

pub use builder::{CompiledView, ViewCompiler};
pub use config::CompilerConfig;
pub use dataset::{
    Dataset, DatasetDescription, DatasetSource, FieldDescription, InMemoryDatasets,
    LabelDescription,
};
pub use errors::{ViewError, ViewResult};
pub use request::{ExtendedRequest, GroupFilter, SampleFilter, ViewRequest};
pub use view::View;
