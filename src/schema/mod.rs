//! Schema catalog subsystem
//!
//! Describes the dynamic, nested document schema the compiler reasons over:
//! scalar fields, dates, embedded documents, label documents and their list
//! containers, frame-level fields and keypoint skeletons.
//!
//! # Design Principles
//!
//! - Field kinds are a closed sum type, matched exhaustively
//! - The catalog is read-only and shared across builds
//! - Lookups for unknown paths return `None`; callers decide whether that is
//!   an error

mod catalog;
mod skeleton;
mod types;

pub use catalog::{Schema, SchemaBuilder, SchemaCatalog, FRAMES_PREFIX};
pub use skeleton::{Skeleton, SkeletonRegistry};
pub use types::{FieldKind, FieldSpec, LabelKind, MediaType};
