//! Scalar extraction and shape coercion.
//!
//! [`extract`] applies one path query to one command's raw result and
//! returns both the matched value and a representative value coerced into
//! the requested [`Shape`]. Nothing here fails: empty input, plain text and
//! unmatched paths all degrade to empty values.

use serde_json::Value;

use crate::host::HostContext;
use crate::mapping::CommandSpec;
use crate::path::{PathExpr, Variables};
use crate::value::{Normalized, Pick, RawResult, Shape, is_empty_value};

/// Result of one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Everything the path matched.
    pub matched: Value,

    /// The matched value reduced to the requested shape.
    pub coerced: Value,
}

impl Extraction {
    /// Check whether the coerced value is empty.
    pub fn is_empty(&self) -> bool {
        is_empty_value(&self.coerced)
    }
}

/// Extract a value for one field from one command result.
///
/// Lists are reduced to their last element for [`Shape::String`]; use
/// [`extract_with`] to choose another policy.
pub fn extract(raw: &RawResult, spec: &CommandSpec, ctx: &HostContext, shape: Shape) -> Extraction {
    extract_with(raw, &spec.path, ctx, shape, Pick::default())
}

/// Extract with an explicit path, variable source and pick policy.
pub fn extract_with(
    raw: &RawResult,
    path: &PathExpr,
    vars: &dyn Variables,
    shape: Shape,
    pick: Pick,
) -> Extraction {
    match raw.normalize() {
        // Emptiness never escalates: the matched value keeps the input's type.
        Normalized::Empty => Extraction {
            matched: raw.to_value(),
            coerced: shape.empty(),
        },
        // Plain text means the command produced no structured data.
        Normalized::Plain => Extraction {
            matched: Value::Array(Vec::new()),
            coerced: match shape {
                Shape::Mapping => Shape::Mapping.empty(),
                Shape::None | Shape::String => Value::Array(Vec::new()),
            },
        },
        Normalized::Data(data) => {
            let matched = match path.evaluate(&data, vars) {
                Value::Null => Value::Array(Vec::new()),
                value => value,
            };
            let coerced = coerce(&matched, shape, pick);
            Extraction { matched, coerced }
        }
    }
}

/// Reduce a matched value to the requested shape.
pub fn coerce(matched: &Value, shape: Shape, pick: Pick) -> Value {
    match (shape, matched) {
        (Shape::None, value) => value.clone(),
        (Shape::String, Value::Array(items)) => {
            let picked = match pick {
                Pick::First => items.first(),
                Pick::Last => items.last(),
            };
            picked.cloned().unwrap_or_else(|| shape.empty())
        }
        (Shape::Mapping, Value::Array(items)) => items
            .iter()
            .find(|item| item.is_object())
            .cloned()
            .unwrap_or_else(|| shape.empty()),
        (_, value) if is_empty_value(value) => shape.empty(),
        (_, value) => value.clone(),
    }
}
