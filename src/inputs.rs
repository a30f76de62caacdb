//! Deployment input sets loaded from YAML files.
//!
//! Inputs are merged shallowly: when several sources define the same key the
//! last source wins and nested mappings are replaced, not combined.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while loading input files.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum InputError {
    /// Raised when an input file does not exist or cannot be read.
    #[error("failed to read inputs file {path}: {message}")]
    Read {
        /// File that could not be read.
        path: Utf8PathBuf,
        /// I/O error message.
        message: String,
    },
    /// Raised when the file is not valid YAML.
    #[error("failed to parse inputs file {path}: {message}")]
    Parse {
        /// File that could not be parsed.
        path: Utf8PathBuf,
        /// Parser error message.
        message: String,
    },
    /// Raised when the document's top level is not a mapping.
    #[error("inputs file {path} must contain a mapping at the top level")]
    NotMapping {
        /// Offending file.
        path: Utf8PathBuf,
    },
}

/// Mapping of deployment input names to values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InputSet(Map<String, Value>);

impl InputSet {
    /// Creates an empty input set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and merges the given files in order.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] for the first file that cannot be read, parsed
    /// or is not a mapping.
    pub fn from_files<P: AsRef<Utf8Path>>(paths: &[P]) -> Result<Self, InputError> {
        let mut merged = Self::new();
        for path in paths {
            merged.merge(load_input_file(path.as_ref())?);
        }
        Ok(merged)
    }

    /// Merges `source` over the current values; colliding keys take the value
    /// from `source`.
    pub fn merge(&mut self, source: Map<String, Value>) {
        self.0.extend(source);
    }

    /// Inserts a single input, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Looks up an input by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Number of inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no inputs are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the underlying mapping.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for InputSet {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Reads one YAML inputs file; an empty or null document yields an empty
/// mapping.
///
/// # Errors
///
/// Returns [`InputError`] when the file is missing, malformed, or its top
/// level is not a mapping.
pub fn load_input_file(path: &Utf8Path) -> Result<Map<String, Value>, InputError> {
    let text = read_text(path)?;
    if text.trim().is_empty() {
        return Ok(Map::new());
    }

    let document: Value = serde_yaml::from_str(&text).map_err(|err| InputError::Parse {
        path: path.to_owned(),
        message: err.to_string(),
    })?;
    match document {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(InputError::NotMapping {
            path: path.to_owned(),
        }),
    }
}

fn read_text(path: &Utf8Path) -> Result<String, InputError> {
    let read_error = |message: String| InputError::Read {
        path: path.to_owned(),
        message,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| read_error(String::from("path has no file name")))?;

    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| read_error(err.to_string()))?;
    dir.read_to_string(file_name)
        .map_err(|err| read_error(err.to_string()))
}
