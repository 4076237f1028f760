//! Structured JSON logger
//!
//! Every record is a single JSON object on its own line: `event`, then
//! `severity`, then the caller's fields in key order. Records below the
//! process-wide threshold are dropped before rendering. Output goes to
//! stderr; stdout belongs to command responses.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Map, Value};

/// Record severity, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-build detail (resolved groups, compiled filter counts)
    Trace,
    /// Build lifecycle and loaded inputs
    Info,
    /// A build scope ended without an outcome
    Warn,
    /// A build failed
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Trace,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Case-insensitive level name as written in config files
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log level '{}'", s))
    }
}

/// Index into `Severity::ALL`
static THRESHOLD: AtomicUsize = AtomicUsize::new(Severity::Info as usize);

pub struct Logger;

impl Logger {
    /// Drops records below `severity` from now on
    pub fn set_min_severity(severity: Severity) {
        THRESHOLD.store(severity as usize, Ordering::Relaxed);
    }

    pub fn min_severity() -> Severity {
        let idx = THRESHOLD.load(Ordering::Relaxed);
        Severity::ALL[idx.min(Severity::ALL.len() - 1)]
    }

    pub fn enabled(severity: Severity) -> bool {
        severity >= Self::min_severity()
    }

    /// Writes one record if `severity` passes the threshold
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if Self::enabled(severity) {
            Self::write_record(&mut io::stderr().lock(), severity, event, fields);
        }
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    /// Record as a JSON line, without the trailing newline
    pub fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut ordered = fields.to_vec();
        ordered.sort_by(|a, b| a.0.cmp(b.0));

        let mut record = Map::new();
        record.insert("event".into(), Value::from(event));
        record.insert("severity".into(), Value::from(severity.as_str()));
        for (key, value) in ordered {
            record.insert(key.to_string(), Value::from(value));
        }
        Value::Object(record).to_string()
    }

    fn write_record<W: Write>(
        writer: &mut W,
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
    ) {
        let line = Self::render(severity, event, fields) + "\n";
        // Logging never fails a build
        let _ = writer.write_all(line.as_bytes()).and_then(|_| writer.flush());
    }
}
