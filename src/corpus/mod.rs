//! Searchable records and the collections that hold them.

pub mod episode;

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::corpus::episode::{Episode, RawEpisode};

/// Field that bare scalar records (e.g. mushaf page numbers) are stored under.
pub const SCALAR_FIELD: &str = "number";

/// Errors that can occur when loading a collection.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Collection not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read collection: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse collection: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Collection must be a JSON array, found {0}")]
    NotAnArray(&'static str),

    #[error("Unsupported record at index {index}: expected an object, number or string, found {kind}")]
    UnsupportedRecord { index: usize, kind: &'static str },
}

/// A single searchable record, e.g. a surah, a juz or a hadith book.
///
/// Records are immutable once built. Cloning shares the underlying fields, so
/// a ranked result can hand out candidates without copying them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(Arc<Map<String, Value>>);

impl Candidate {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(Arc::new(fields))
    }

    /// Build a candidate from one JSON record.
    ///
    /// Objects are taken as-is; numbers and strings are wrapped under
    /// [`SCALAR_FIELD`].
    pub fn from_json(value: Value) -> Result<Self, &'static str> {
        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            scalar @ (Value::Number(_) | Value::String(_)) => {
                let mut fields = Map::new();
                fields.insert(SCALAR_FIELD.to_string(), scalar);
                Ok(Self::new(fields))
            }
            other => Err(json_kind(&other)),
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Comparable text for `field`, or `None` when the field is absent or
    /// falsy (empty string, zero, `false`, `null`, empty array).
    ///
    /// Numbers are rendered in decimal and arrays are joined with `,`.
    #[must_use]
    pub fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.0.get(field)? {
            Value::String(s) if !s.is_empty() => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(Cow::Owned(n.to_string())),
            Value::Bool(true) => Some(Cow::Borrowed("true")),
            Value::Array(items) if !items.is_empty() => Some(Cow::Owned(join_elements(items))),
            _ => None,
        }
    }

    /// Do both candidates share the same underlying record?
    #[must_use]
    pub fn same_record(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Map<String, Value>> for Candidate {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

fn join_elements(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(nested) => join_elements(nested),
            Value::Null | Value::Object(_) => String::new(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A named, ordered set of candidates searched together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    name: String,
    candidates: Vec<Candidate>,
}

impl Collection {
    #[must_use]
    pub fn new(name: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Build a collection from a parsed JSON array.
    ///
    /// Raw podcast episode records are prepared into display form on the way
    /// in; see [`episode`].
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::NotAnArray` if `value` is not an array and
    /// `CorpusError::UnsupportedRecord` for elements that are not objects,
    /// numbers or strings.
    pub fn from_json(name: impl Into<String>, value: Value) -> Result<Self, CorpusError> {
        let Value::Array(records) = value else {
            return Err(CorpusError::NotAnArray(json_kind(&value)));
        };

        let mut candidates = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let candidate = if RawEpisode::looks_like(&record) {
                let raw: RawEpisode = serde_json::from_value(record)?;
                Episode::prepare(raw).into_candidate()
            } else {
                Candidate::from_json(record)
                    .map_err(|kind| CorpusError::UnsupportedRecord { index, kind })?
            };
            candidates.push(candidate);
        }

        Ok(Self::new(name, candidates))
    }

    /// Load a collection from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::NotFound` if the file doesn't exist,
    /// `CorpusError::ReadError`/`ParseError` if it can't be read or parsed, and
    /// the errors of [`Collection::from_json`] for unexpected shapes.
    pub fn load(name: impl Into<String>, path: &Path) -> Result<Self, CorpusError> {
        if !path.exists() {
            return Err(CorpusError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        Self::from_json(name, value)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
