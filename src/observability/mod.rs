//! Observability subsystem
//!
//! Structured JSON logging for view construction. Each `get_view` call is
//! wrapped in a `VIEW_BUILD` scope carrying a build id; finer events are
//! emitted at TRACE so they can be switched on from the config.
//!
//! # Design Principles
//!
//! - Logging never changes what a build returns
//! - Synchronous and unbuffered, no background threads
//! - Same inputs, same records (field order included)

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Logs `event` with no fields
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Logs `event`; detail events go out at TRACE, the rest at INFO
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_detail() {
        Severity::Trace
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
