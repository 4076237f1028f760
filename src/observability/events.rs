//! Observable compiler events
//!
//! Events are explicit and typed. Build start/complete/failure lines come
//! from the `VIEW_BUILD` observation scope.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration file loaded
    ConfigLoaded,
    /// Dataset description loaded
    DatasetLoaded,
    /// Saved view returned without ad hoc filtering
    SavedViewLoaded,
    /// Group filter applied
    GroupFilterResolved,
    /// Filters compiled into stages
    FilterStagesCompiled,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DatasetLoaded => "DATASET_LOADED",
            Event::SavedViewLoaded => "SAVED_VIEW_LOADED",
            Event::GroupFilterResolved => "GROUP_FILTER_RESOLVED",
            Event::FilterStagesCompiled => "FILTER_STAGES_COMPILED",
        }
    }

    /// Per-build detail is logged below INFO
    pub fn is_detail(&self) -> bool {
        matches!(self, Event::GroupFilterResolved | Event::FilterStagesCompiled)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
