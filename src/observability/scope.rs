//! Start/outcome logging around one view build
//!
//! A scope logs `{name}_START` when opened and exactly one outcome record:
//! `{name}_COMPLETE`, `{name}_FAILED`, or `{name}_INCOMPLETE` if it is
//! dropped without either (a panic or an early return that skipped it).
//! Every record repeats the fields the scope was opened with.

use std::time::Instant;

use super::logger::{Logger, Severity};

pub struct ObservationScope {
    name: String,
    fields: Vec<(String, String)>,
    started: Instant,
    finished: bool,
}

impl ObservationScope {
    pub fn with_fields(name: &str, fields: &[(&str, &str)]) -> Self {
        let scope = Self {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            started: Instant::now(),
            finished: false,
        };
        scope.emit(Severity::Info, "START", &[]);
        scope
    }

    pub fn new(name: &str) -> Self {
        Self::with_fields(name, &[])
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn emit(&self, severity: Severity, suffix: &str, extra: &[(&str, &str)]) {
        let mut fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        fields.extend_from_slice(extra);
        Logger::log(severity, &format!("{}_{}", self.name, suffix), &fields);
    }

    /// Logs `{name}_COMPLETE` with the elapsed time and `extra`
    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_ms().to_string();
        let mut fields = vec![("elapsed_ms", elapsed.as_str())];
        fields.extend_from_slice(extra);
        self.emit(Severity::Info, "COMPLETE", &fields);
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Logs `{name}_FAILED` with the error code and message
    pub fn fail(mut self, code: &str, reason: &str) {
        self.finished = true;
        self.emit(Severity::Error, "FAILED", &[("code", code), ("reason", reason)]);
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            self.emit(Severity::Warn, "INCOMPLETE", &[]);
        }
    }
}
