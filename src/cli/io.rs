//! JSON I/O handling for CLI
//!
//! - Input: one JSON object per request, from a file or stdin
//! - Output: one JSON object per line on stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a JSON request from `path`, or all of stdin if `None`
pub fn read_request(path: Option<&Path>) -> CliResult<Value> {
    let content = match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| CliError::Io(format!("failed to read {}: {}", path.display(), e)))?,
        None => {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            buf
        }
    };

    if content.trim().is_empty() {
        return Err(CliError::InvalidRequest("empty input".into()));
    }

    Ok(serde_json::from_str(&content)?)
}

/// Read newline-delimited JSON requests from stdin, skipping blank lines
pub fn read_requests() -> impl Iterator<Item = CliResult<Value>> {
    let stdin = io::stdin();
    stdin
        .lock()
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|line| {
            let line = line.map_err(CliError::from)?;
            serde_json::from_str(&line).map_err(CliError::from)
        })
}

fn write_line<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn ok_envelope(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

pub(crate) fn error_envelope(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&mut io::stdout(), &ok_envelope(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&mut io::stdout(), &error_envelope(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_request_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"dataset": "quickstart"}}"#).unwrap();
        let value = read_request(Some(file.path())).unwrap();
        assert_eq!(value["dataset"], "quickstart");
    }

    #[test]
    fn test_empty_request_rejected() {
        let file = NamedTempFile::new().unwrap();
        let err = read_request(Some(file.path())).unwrap_err();
        assert_eq!(err.code(), "AERO_CLI_INVALID_REQUEST");
    }

    #[test]
    fn test_envelopes() {
        let mut out = Vec::new();
        write_line(&mut out, &error_envelope("AERO_X", "boom")).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.ends_with('\n'));
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["code"], "AERO_X");
        assert_eq!(ok_envelope(Value::Null)["status"], "ok");
    }
}
