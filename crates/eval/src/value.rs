//! Runtime values produced by evaluating expressions.
//!
//! All numeric values use `bigdecimal::BigDecimal` -- never `f64`.

use std::collections::BTreeMap;
use std::fmt;

use bigdecimal::BigDecimal;
use num_traits::Zero;
use scenario_core::Expression;
use serde::{Deserialize, Serialize};

use crate::numeric;

/// The all-zero address, used by the `zero` address literal.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// ──────────────────────────────────────────────
// Value kinds
// ──────────────────────────────────────────────

/// Runtime tag of a [`Value`], used for coercion targets and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Number,
    ScaledNumber,
    PercentNumber,
    PreciseNumber,
    String,
    Address,
    List,
    Map,
    Anything,
    Nothing,
    Event,
}

impl ValueKind {
    /// Whether a value satisfies a coercion that targets this kind.
    ///
    /// Tags must match, except that scaled and percent numbers refine
    /// `Number`, and percent numbers refine `ScaledNumber`.
    pub fn accepts(self, value: &Value) -> bool {
        let actual = value.kind();
        match self {
            ValueKind::Number => matches!(
                actual,
                ValueKind::Number | ValueKind::ScaledNumber | ValueKind::PercentNumber
            ),
            ValueKind::ScaledNumber => {
                matches!(actual, ValueKind::ScaledNumber | ValueKind::PercentNumber)
            }
            other => other == actual,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Bool => "Bool",
            ValueKind::Number => "Number",
            ValueKind::ScaledNumber => "ScaledNumber",
            ValueKind::PercentNumber => "PercentNumber",
            ValueKind::PreciseNumber => "PreciseNumber",
            ValueKind::String => "String",
            ValueKind::Address => "Address",
            ValueKind::List => "List",
            ValueKind::Map => "Map",
            ValueKind::Anything => "Anything",
            ValueKind::Nothing => "Nothing",
            ValueKind::Event => "Event",
        };
        f.write_str(s)
    }
}

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// A tagged runtime value.
///
/// Derived `PartialEq` is structural and is meant for tests and caching.
/// Assertion semantics (wildcards, precision, cross-tag numerics) live in
/// [`Value::compare_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Number(BigDecimal),
    /// A number already multiplied by the fixed-point scale (e.g. 1e18).
    Scaled(BigDecimal),
    /// A scaled number tagged as a percentage.
    Percent(BigDecimal),
    /// A number that only matches up to `sig_figs` significant digits.
    Precise { value: BigDecimal, sig_figs: u32 },
    String(String),
    Address(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Matches every value.
    Anything,
    /// Matches no value, itself included.
    Nothing,
    /// An unevaluated expression, left for a later coercion to interpret.
    Event(Expression),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::Scaled(_) => ValueKind::ScaledNumber,
            Value::Percent(_) => ValueKind::PercentNumber,
            Value::Precise { .. } => ValueKind::PreciseNumber,
            Value::String(_) => ValueKind::String,
            Value::Address(_) => ValueKind::Address,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Anything => ValueKind::Anything,
            Value::Nothing => ValueKind::Nothing,
            Value::Event(_) => ValueKind::Event,
        }
    }

    /// The numeric magnitude of number-family values.
    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Value::Number(n) | Value::Scaled(n) | Value::Percent(n) => Some(n),
            _ => None,
        }
    }

    /// Truthiness: total over every variant.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) | Value::Scaled(n) | Value::Percent(n) => !n.is_zero(),
            Value::Precise { value, .. } => !value.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::Address(a) => !a.is_empty() && !a.eq_ignore_ascii_case(ZERO_ADDRESS),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Anything => true,
            Value::Nothing => false,
            Value::Event(_) => true,
        }
    }

    /// Assertion equality between two values. Never fails.
    ///
    /// - `Anything` equals everything, `Nothing` included.
    /// - `Nothing` equals nothing, not even another `Nothing`.
    /// - Number, scaled and percent values compare by numeric value.
    /// - A precise number compares only to its significant figures.
    /// - Lists and maps compare element by element.
    /// - Otherwise differing tags are unequal.
    pub fn compare_to(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Anything, _) | (_, Value::Anything) => true,
            (Value::Nothing, _) | (_, Value::Nothing) => false,
            (Value::Precise { value, sig_figs }, rhs)
            | (rhs, Value::Precise { value, sig_figs }) => {
                let (target, figures) = match rhs {
                    Value::Precise {
                        value: other_value,
                        sig_figs: other_figs,
                    } => (other_value, (*sig_figs).min(*other_figs)),
                    _ => match rhs.as_number() {
                        Some(n) => (n, *sig_figs),
                        None => return false,
                    },
                };
                numeric::round_sig_figs(value, figures) == numeric::round_sig_figs(target, figures)
            }
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Address(l), Value::Address(r)) => l.eq_ignore_ascii_case(r),
            (Value::List(l), Value::List(r)) => {
                l.len() == r.len() && l.iter().zip(r).all(|(a, b)| a.compare_to(b))
            }
            (Value::Map(l), Value::Map(r)) => {
                l.len() == r.len() && l.iter().all(|(k, v)| entry_matches(r, k, v))
            }
            (Value::Event(l), Value::Event(r)) => l == r,
            (l, r) => match (l.as_number(), r.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Convert to JSON. Numbers are rendered as plain strings to keep
    /// full precision.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Value::Bool(b) => json!(b),
            Value::Number(n) => json!(numeric::to_plain_string(n)),
            Value::Scaled(n) => json!({ "scaled": numeric::to_plain_string(n) }),
            Value::Percent(n) => json!({ "percent": numeric::to_plain_string(n) }),
            Value::Precise { value, sig_figs } => json!({
                "precise": numeric::to_plain_string(value),
                "sig_figs": sig_figs,
            }),
            Value::String(s) => json!(s),
            Value::Address(a) => json!({ "address": a }),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Anything => json!("Anything"),
            Value::Nothing => json!("Nothing"),
            Value::Event(e) => json!({ "event": e.to_string() }),
        }
    }
}

fn entry_matches(map: &BTreeMap<String, Value>, key: &str, value: &Value) -> bool {
    map.get(key).is_some_and(|other| value.compare_to(other))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", numeric::to_plain_string(n)),
            Value::Scaled(n) => write!(f, "ScaledNumber({})", numeric::to_plain_string(n)),
            Value::Percent(n) => write!(f, "PercentNumber({})", numeric::to_plain_string(n)),
            Value::Precise { value, sig_figs } => write!(
                f,
                "PreciseNumber({}, {} sig figs)",
                numeric::to_plain_string(value),
                sig_figs
            ),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Address(a) => write!(f, "Address({})", a),
            Value::List(items) => {
                f.write_str("List[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("Map{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Anything => f.write_str("Anything"),
            Value::Nothing => f.write_str("Nothing"),
            Value::Event(e) => write!(f, "Event({})", e),
        }
    }
}
