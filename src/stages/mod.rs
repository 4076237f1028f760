//! Stage factory
//!
//! Views are ordered lists of `Stage` values. The compiler only builds and
//! orders stages; executing them is the job of the external aggregation
//! engine, which runs them strictly in sequence.

mod errors;
mod stage;

pub use errors::{StageError, StageResult};
pub use stage::Stage;
