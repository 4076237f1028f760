//! 12-byte document identifiers
//!
//! Ids travel over the wire as 24-character hex strings. Parsing is strict:
//! anything that does not decode to exactly 12 bytes is rejected and the
//! error is propagated to the caller unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Malformed ObjectId string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid ObjectId '{value}': {reason}")]
pub struct ObjectIdError {
    /// The rejected input
    pub value: String,
    /// Why it was rejected
    pub reason: String,
}

/// A 12-byte document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Parses an id from its 24-character hex form
    pub fn parse(value: &str) -> Result<Self, ObjectIdError> {
        if value.len() != 24 {
            return Err(ObjectIdError {
                value: value.to_string(),
                reason: format!("expected 24 hex characters, found {}", value.len()),
            });
        }

        let mut bytes = [0u8; 12];
        hex::decode_to_slice(value, &mut bytes).map_err(|e| ObjectIdError {
            value: value.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self(bytes))
    }

    /// Parses every id in `values`, failing on the first malformed one
    pub fn parse_all<S: AsRef<str>>(values: &[S]) -> Result<Vec<Self>, ObjectIdError> {
        values.iter().map(|v| Self::parse(v.as_ref())).collect()
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Lowercase hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
