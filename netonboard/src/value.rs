//! Raw command results and the value shapes the engine produces.
//!
//! Command output reaches the engine either as text (plain CLI output or a
//! JSON document that was never decoded) or as structured data already
//! produced by a parsing backend. [`RawResult`] keeps the two apart; every
//! conversion between them happens in [`RawResult::normalize`].

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The value returned by running one command on one host.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// Undecoded output. May be empty, plain text, or a JSON document.
    Text(String),

    /// Structured output from a parsing backend (mapping or list of mappings).
    Structured(Value),
}

static EMPTY_RESULT: RawResult = RawResult::EMPTY;

/// A raw result after string normalization.
#[derive(Debug)]
pub(crate) enum Normalized<'a> {
    /// Empty string, empty list or empty mapping.
    Empty,

    /// Non-empty text that is not a JSON document.
    Plain,

    /// Structured data, decoded from text if needed.
    Data(Cow<'a, Value>),
}

impl RawResult {
    /// An empty text result, the value of a command that produced nothing.
    pub const EMPTY: RawResult = RawResult::Text(String::new());

    /// Check for an empty string, empty list or empty mapping.
    pub fn is_empty(&self) -> bool {
        match self {
            RawResult::Text(text) => text.is_empty(),
            RawResult::Structured(value) => is_empty_value(value),
        }
    }

    /// The result as a JSON value, without decoding text.
    pub fn to_value(&self) -> Value {
        match self {
            RawResult::Text(text) => Value::String(text.clone()),
            RawResult::Structured(value) => value.clone(),
        }
    }

    /// Decode text into structured data where possible.
    ///
    /// Only JSON documents whose top level is a mapping or a list count as
    /// structured; anything else is plain text.
    pub(crate) fn normalize(&self) -> Normalized<'_> {
        if self.is_empty() {
            return Normalized::Empty;
        }
        match self {
            RawResult::Text(text) => match serde_json::from_str::<Value>(text) {
                Ok(value @ (Value::Object(_) | Value::Array(_))) => {
                    Normalized::Data(Cow::Owned(value))
                }
                _ => Normalized::Plain,
            },
            RawResult::Structured(value) => Normalized::Data(Cow::Borrowed(value)),
        }
    }
}

impl From<Value> for RawResult {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RawResult::Text(text),
            Value::Null => RawResult::EMPTY,
            other => RawResult::Structured(other),
        }
    }
}

impl From<String> for RawResult {
    fn from(text: String) -> Self {
        RawResult::Text(text)
    }
}

impl From<&str> for RawResult {
    fn from(text: &str) -> Self {
        RawResult::Text(text.to_string())
    }
}

/// Raw results for one host, keyed by command string.
///
/// A command with no entry reads as [`RawResult::EMPTY`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "IndexMap<String, Value>")]
pub struct CommandResults {
    results: IndexMap<String, RawResult>,
}

impl CommandResults {
    /// Create an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the result of a command.
    pub fn insert(&mut self, command: impl Into<String>, result: impl Into<RawResult>) {
        self.results.insert(command.into(), result.into());
    }

    /// Add a result, builder style.
    pub fn with(mut self, command: impl Into<String>, result: impl Into<RawResult>) -> Self {
        self.insert(command, result);
        self
    }

    /// Get the result of a command, treating a missing command as empty.
    pub fn get(&self, command: &str) -> &RawResult {
        self.results.get(command).unwrap_or(&EMPTY_RESULT)
    }

    /// Check whether a command produced a result.
    pub fn contains(&self, command: &str) -> bool {
        self.results.contains_key(command)
    }

    /// Number of commands with results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if no results were collected.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate over `(command, result)` pairs in collection order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawResult)> {
        self.results.iter()
    }
}

impl From<IndexMap<String, Value>> for CommandResults {
    fn from(map: IndexMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<RawResult>> FromIterator<(K, V)> for CommandResults {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            results: iter
                .into_iter()
                .map(|(command, result)| (command.into(), result.into()))
                .collect(),
        }
    }
}

/// Single-value representation requested for a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Keep the matched value as is.
    #[default]
    None,

    /// Reduce to one scalar.
    #[serde(alias = "str")]
    String,

    /// Reduce to one mapping.
    #[serde(alias = "dict")]
    Mapping,
}

impl Shape {
    /// The canonical empty value of this shape.
    pub fn empty(self) -> Value {
        match self {
            Shape::None => Value::Array(Vec::new()),
            Shape::String => Value::String(String::new()),
            Shape::Mapping => Value::Object(Map::new()),
        }
    }
}

/// Which element wins when a list is reduced to a single scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pick {
    First,
    #[default]
    Last,
}

/// Type conversion applied to a value once it has been shaped.
///
/// Lists are converted element by element. Values that do not convert
/// (e.g. `"auto"` cast to `int`) and mappings are kept unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cast {
    #[serde(alias = "integer")]
    Int,

    #[serde(alias = "boolean")]
    Bool,

    #[serde(alias = "str")]
    String,
}

impl Cast {
    /// Convert a value.
    pub fn apply(self, value: Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.into_iter().map(|v| self.apply(v)).collect()),
            Value::Object(_) | Value::Null => value,
            scalar => self.convert(&scalar).unwrap_or(scalar),
        }
    }

    fn convert(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Cast::Int, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (Cast::Int, Value::Number(n)) if n.is_f64() => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| Value::from(f as i64)),
            (Cast::Int, Value::Bool(b)) => Some(Value::from(i64::from(*b))),
            (Cast::Bool, Value::String(s)) => parse_bool(s).map(Value::Bool),
            (Cast::Bool, Value::Number(n)) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
            (Cast::String, Value::Bool(_) | Value::Number(_)) => {
                scalar_text(value).map(Value::String)
            }
            _ => None,
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Check for null, an empty string, an empty list or an empty mapping.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Render a scalar as text; null becomes the empty string.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
