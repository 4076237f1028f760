//! Condition and expression builders
//!
//! Filters are compiled into two small trees rather than strings:
//!
//! - `Query`: document-level conditions used by match stages
//! - `Expr`: element-level aggregation expressions used inside list filters,
//!   set-field stages and folds
//!
//! Both render to `serde_json::Value` in the executor's operator syntax.
//! Rendering is deterministic: the same tree always yields the same JSON.

mod expression;
mod literal;
mod object_id;
mod query;

pub use expression::{CmpOp, Expr, FieldRoot};
pub use literal::Literal;
pub use object_id::{ObjectId, ObjectIdError};
pub use query::{Query, QueryOp};
