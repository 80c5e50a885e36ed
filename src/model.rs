use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// A coerced value parsed from the right-hand side of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Render the value the way it is written into the process environment.
    ///
    /// Booleans become `1`/`0`; numbers use their decimal text form.
    pub fn to_env_string(&self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Bool(true) => "1".to_owned(),
            Self::Bool(false) => "0".to_owned(),
            Self::Str(value) => value.clone(),
        }
    }

    /// Name of the variant, as shown by `easyenv check`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
        }
    }

    /// Only the empty string counts as empty; `0` and `false` are values.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Str(value) if value.is_empty())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_env_string())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        crate::parser::parse_value(value)
    }
}

/// A validated `KEY=VALUE` entry from a file or input buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Value,
    pub source: Option<PathBuf>,
    /// 1-based line number in the source text.
    pub line: usize,
}

/// Summary of the load operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped_existing: usize,
    pub skipped_invalid: usize,
    pub files_read: usize,
    pub files_skipped: usize,
}

/// Settings for a single load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Files to read, in order. Empty means `.env` in the working directory.
    pub paths: Vec<PathBuf>,
    /// Never replace a key that already holds a non-empty value.
    pub append: bool,
    /// Skip invalid paths, unreadable files and bad rows instead of failing.
    pub silent: bool,
    /// Also write entries into the environment sink.
    pub system: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            append: false,
            silent: false,
            system: true,
        }
    }
}

/// In-process store of typed values, keyed by variable name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnvStore {
    values: BTreeMap<String, Value>,
}

impl EnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether `key` is present with anything other than an empty string.
    pub fn has_value(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|value| !value.is_empty())
    }

    /// Rendered value of `key`, or an empty string when it is missing.
    pub fn get_string(&self, key: &str) -> String {
        self.get_string_opt(key).unwrap_or_default()
    }

    pub fn get_string_opt(&self, key: &str) -> Option<String> {
        self.values.get(key).map(Value::to_env_string)
    }

    /// Boolean value of `key`; `false` when missing or not a boolean.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get_bool_opt(key).unwrap_or(false)
    }

    pub fn get_bool_opt(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_int)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_float)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Value)> for EnvStore {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
