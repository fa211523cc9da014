//! Path-query expressions over semi-structured command output.
//!
//! The language is a small JMESPath subset, enough to address the records
//! produced by parsing backends:
//!
//! ```text
//! serial                      attribute access
//! version.image               nested attribute access
//! [0].serial                  list index (negative counts from the end)
//! [*].interface               wildcard projection over a list
//! interfaces.*.mtu            projection over the values of a mapping
//! [?ip_address=='{{ host }}'].interface
//!                             filter projection; literals may reference
//!                             host variables
//! [*].mtu | [0]               pipe: stop the projection, continue on its result
//! "802.1q".mode               quoted identifier
//! @                           the current node
//! ```
//!
//! A projection applies the rest of its chain to every element and drops
//! elements where the result is absent. Absence is reported as `null`.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::value::scalar_text;

/// Syntax error in a path expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at position {position}")]
pub struct PathError {
    /// Byte offset of the offending input.
    pub position: usize,

    /// What the parser expected.
    pub message: String,
}

impl PathError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Source of values for `{{ name }}` placeholders.
pub trait Variables {
    /// Look up a variable by name.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Variable source that defines nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVariables;

impl Variables for NoVariables {
    fn lookup(&self, _name: &str) -> Option<String> {
        None
    }
}

impl Variables for IndexMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    source: String,
    stages: Vec<Vec<Step>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Current,
    Field(String),
    Index(i64),
    Wildcard,
    Values,
    Filter(Filter),
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    lhs: Operand,
    op: CmpOp,
    rhs: Operand,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Path(Vec<Step>),
    Literal(Template),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
}

/// Literal text with `{{ name }}` placeholders.
#[derive(Debug, Clone, PartialEq)]
struct Template {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Text(String),
    Var(String),
}

impl Template {
    /// Split literal text into text and placeholder parts.
    ///
    /// `offset` is the byte position of `text` inside the whole expression.
    fn parse(text: &str, offset: usize) -> Result<Self, PathError> {
        let mut parts = Vec::new();
        let mut rest = text;
        let mut consumed = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                parts.push(Part::Text(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = after.find("}}").ok_or_else(|| {
                PathError::new(offset + consumed + open, "unterminated '{{' placeholder")
            })?;
            let name = after[..close].trim();
            if !is_identifier(name) {
                return Err(PathError::new(
                    offset + consumed + open,
                    format!("invalid placeholder name '{}'", name),
                ));
            }
            parts.push(Part::Var(name.to_string()));

            let advance = open + 2 + close + 2;
            consumed += advance;
            rest = &rest[advance..];
        }
        if !rest.is_empty() {
            parts.push(Part::Text(rest.to_string()));
        }

        Ok(Self { parts })
    }

    fn render(&self, vars: &dyn Variables) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Var(name) => match vars.lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => warn!("Undefined variable '{}' in path expression", name),
                },
            }
        }
        out
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Bytes allowed after the first character of a bare field name.
fn is_identifier_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

impl PathExpr {
    /// Parse a path expression.
    pub fn parse(source: &str) -> Result<Self, PathError> {
        let mut parser = Parser {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
        };
        let stages = parser.expression()?;
        Ok(Self {
            source: source.to_string(),
            stages,
        })
    }

    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate against structured data. Returns `null` when nothing matches.
    pub fn evaluate(&self, data: &Value, vars: &dyn Variables) -> Value {
        let mut current = data.clone();
        for stage in &self.stages {
            current = eval_chain(&current, stage, vars);
        }
        current
    }
}

impl FromStr for PathExpr {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval_chain(value: &Value, steps: &[Step], vars: &dyn Variables) -> Value {
    let mut current = value;
    for (i, step) in steps.iter().enumerate() {
        let rest = &steps[i + 1..];
        match step {
            Step::Current => {}
            Step::Field(name) => match current.get(name.as_str()) {
                Some(next) if current.is_object() => current = next,
                _ => return Value::Null,
            },
            Step::Index(index) => {
                let Some(items) = current.as_array() else {
                    return Value::Null;
                };
                let resolved = if *index < 0 {
                    items.len().checked_sub(index.unsigned_abs() as usize)
                } else {
                    Some(*index as usize)
                };
                match resolved.and_then(|i| items.get(i)) {
                    Some(next) => current = next,
                    None => return Value::Null,
                }
            }
            Step::Wildcard => {
                let Some(items) = current.as_array() else {
                    return Value::Null;
                };
                return project(items.iter(), rest, vars);
            }
            Step::Values => {
                let Some(map) = current.as_object() else {
                    return Value::Null;
                };
                return project(map.values(), rest, vars);
            }
            Step::Filter(filter) => {
                let Some(items) = current.as_array() else {
                    return Value::Null;
                };
                return project(
                    items.iter().filter(|item| filter.matches(item, vars)),
                    rest,
                    vars,
                );
            }
        }
    }
    current.clone()
}

fn project<'a>(
    items: impl Iterator<Item = &'a Value>,
    rest: &[Step],
    vars: &dyn Variables,
) -> Value {
    Value::Array(
        items
            .map(|item| eval_chain(item, rest, vars))
            .filter(|result| !result.is_null())
            .collect(),
    )
}

impl Filter {
    fn matches(&self, item: &Value, vars: &dyn Variables) -> bool {
        let lhs = self.lhs.resolve(item, vars);
        let rhs = self.rhs.resolve(item, vars);
        let equal = match (scalar_key(&lhs), scalar_key(&rhs)) {
            (Some(l), Some(r)) => l == r,
            _ => lhs == rhs,
        };
        match self.op {
            CmpOp::Eq => equal,
            CmpOp::Ne => !equal,
        }
    }
}

/// Scalars compare by their text so `16` matches `'16'`; null never does.
fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => scalar_text(other),
    }
}

impl Operand {
    fn resolve(&self, item: &Value, vars: &dyn Variables) -> Value {
        match self {
            Operand::Path(steps) => eval_chain(item, steps, vars),
            Operand::Literal(template) => Value::String(template.render(vars)),
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> PathError {
        PathError::new(self.pos, message)
    }

    fn expect(&mut self, byte: u8) -> Result<(), PathError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    fn expression(&mut self) -> Result<Vec<Vec<Step>>, PathError> {
        let mut stages = Vec::new();
        loop {
            self.skip_ws();
            stages.push(self.chain()?);
            self.skip_ws();
            match self.peek() {
                Some(b'|') => self.pos += 1,
                None => return Ok(stages),
                Some(c) => return Err(self.error(format!("unexpected '{}'", c as char))),
            }
        }
    }

    fn chain(&mut self) -> Result<Vec<Step>, PathError> {
        let mut steps = vec![self.first_step()?];
        loop {
            match self.peek() {
                Some(b'.') => {
                    self.pos += 1;
                    if self.peek() == Some(b'*') {
                        self.pos += 1;
                        steps.push(Step::Values);
                    } else {
                        steps.push(Step::Field(self.identifier()?));
                    }
                }
                Some(b'[') => steps.push(self.bracket()?),
                _ => return Ok(steps),
            }
        }
    }

    fn first_step(&mut self) -> Result<Step, PathError> {
        match self.peek() {
            Some(b'[') => self.bracket(),
            Some(b'@') => {
                self.pos += 1;
                Ok(Step::Current)
            }
            Some(b'*') => {
                self.pos += 1;
                Ok(Step::Values)
            }
            Some(_) => Ok(Step::Field(self.identifier()?)),
            None => Err(self.error("expected an expression")),
        }
    }

    fn identifier(&mut self) -> Result<String, PathError> {
        match self.peek() {
            Some(b'"') => self.quoted(b'"'),
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => {
                let start = self.pos;
                while self.peek().is_some_and(is_identifier_byte) {
                    self.pos += 1;
                }
                Ok(self.src[start..self.pos].to_string())
            }
            _ => Err(self.error("expected an identifier")),
        }
    }

    fn quoted(&mut self, quote: u8) -> Result<String, PathError> {
        let open = self.pos;
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let text = self.src[start..self.pos].to_string();
                self.pos += 1;
                if text.is_empty() && quote == b'"' {
                    return Err(PathError::new(open, "empty quoted identifier"));
                }
                return Ok(text);
            }
            self.pos += 1;
        }
        Err(PathError::new(open, "unterminated quoted string"))
    }

    fn bracket(&mut self) -> Result<Step, PathError> {
        self.expect(b'[')?;
        self.skip_ws();
        let step = match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                Step::Wildcard
            }
            Some(b'?') => {
                self.pos += 1;
                Step::Filter(self.filter()?)
            }
            Some(c) if c == b'-' || c.is_ascii_digit() => Step::Index(self.integer()?),
            _ => return Err(self.error("expected '*', '?' or an index")),
        };
        self.skip_ws();
        self.expect(b']')?;
        Ok(step)
    }

    fn integer(&mut self) -> Result<i64, PathError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.src[start..self.pos]
            .parse()
            .map_err(|_| PathError::new(start, "invalid index"))
    }

    fn filter(&mut self) -> Result<Filter, PathError> {
        self.skip_ws();
        let lhs = self.operand()?;
        self.skip_ws();
        let rest = &self.src[self.pos..];
        let op = if rest.starts_with("==") {
            CmpOp::Eq
        } else if rest.starts_with("!=") {
            CmpOp::Ne
        } else {
            return Err(self.error("expected '==' or '!='"));
        };
        self.pos += 2;
        self.skip_ws();
        let rhs = self.operand()?;
        Ok(Filter { lhs, op, rhs })
    }

    fn operand(&mut self) -> Result<Operand, PathError> {
        if self.peek() == Some(b'\'') {
            let start = self.pos + 1;
            let text = self.quoted(b'\'')?;
            Ok(Operand::Literal(Template::parse(&text, start)?))
        } else {
            Ok(Operand::Path(self.chain()?))
        }
    }
}
