//! Filter wire types
//!
//! One `FilterSpec` per filtered path, exactly as the client sends it.
//! Keys that do not apply to a field's kind are simply absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Filters keyed by path; `BTreeMap` iteration gives the sorted-path
/// processing order every assembler relies on
pub type Filters = BTreeMap<String, FilterSpec>;

/// Declarative predicate for one path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Accepted string/id values; `null` stands for "missing or null"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Option<String>>>,

    /// Inclusive `[min, max]`; dates are millisecond timestamps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,

    #[serde(rename = "true", default, skip_serializing_if = "Option::is_none")]
    pub include_true: Option<bool>,

    #[serde(rename = "false", default, skip_serializing_if = "Option::is_none")]
    pub include_false: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nan: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inf: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ninf: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub none: Option<bool>,

    /// Inverts the predicate
    #[serde(default)]
    pub exclude: bool,

    /// Keep documents with any matching element instead of pruning elements
    #[serde(default)]
    pub is_matching: bool,

    /// Case-insensitive substring search on string fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Non-finite numeric markers that are toggled, never folded into `range`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    Nan,
    Inf,
    Ninf,
    None,
}

impl Sentinel {
    pub const ALL: [Sentinel; 4] = [Sentinel::Nan, Sentinel::Inf, Sentinel::Ninf, Sentinel::None];
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value filter over non-null strings
    pub fn values<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self {
            values: Some(values.into_iter().map(|v| Some(v.into())).collect()),
            ..Self::default()
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self {
            range: Some([min, max]),
            ..Self::default()
        }
    }

    pub fn booleans(include_true: bool, include_false: bool) -> Self {
        Self {
            include_true: Some(include_true),
            include_false: Some(include_false),
            ..Self::default()
        }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn excluded(mut self) -> Self {
        self.exclude = true;
        self
    }

    pub fn matching(mut self) -> Self {
        self.is_matching = true;
        self
    }

    pub fn with_sentinel(mut self, sentinel: Sentinel, value: bool) -> Self {
        *self.sentinel_mut(sentinel) = Some(value);
        self
    }

    pub fn with_none_value(mut self) -> Self {
        self.values.get_or_insert_with(Vec::new).push(None);
        self
    }

    pub fn sentinel(&self, sentinel: Sentinel) -> Option<bool> {
        match sentinel {
            Sentinel::Nan => self.nan,
            Sentinel::Inf => self.inf,
            Sentinel::Ninf => self.ninf,
            Sentinel::None => self.none,
        }
    }

    fn sentinel_mut(&mut self, sentinel: Sentinel) -> &mut Option<bool> {
        match sentinel {
            Sentinel::Nan => &mut self.nan,
            Sentinel::Inf => &mut self.inf,
            Sentinel::Ninf => &mut self.ninf,
            Sentinel::None => &mut self.none,
        }
    }

    /// Whether any sentinel key was sent at all
    pub fn has_sentinels(&self) -> bool {
        Sentinel::ALL.iter().any(|s| self.sentinel(*s).is_some())
    }

    /// Sentinels explicitly toggled on
    pub fn set_sentinels(&self) -> Vec<Sentinel> {
        Sentinel::ALL
            .into_iter()
            .filter(|s| self.sentinel(*s) == Some(true))
            .collect()
    }

    /// Sentinels not toggled on (absent or false)
    pub fn unset_sentinels(&self) -> Vec<Sentinel> {
        Sentinel::ALL
            .into_iter()
            .filter(|s| self.sentinel(*s) != Some(true))
            .collect()
    }

    /// Non-null requested values
    pub fn present_values(&self) -> Vec<String> {
        self.values
            .iter()
            .flatten()
            .filter_map(|v| v.clone())
            .collect()
    }

    /// Whether missing/null values are requested (via `null` or `none`)
    pub fn wants_none(&self) -> bool {
        self.none == Some(true) || self.values.iter().flatten().any(Option::is_none)
    }

    /// Copy with `exclude` cleared, for building element predicates whose
    /// inversion is applied by the enclosing list test
    pub fn without_exclude(&self) -> Self {
        Self {
            exclude: false,
            ..self.clone()
        }
    }
}
