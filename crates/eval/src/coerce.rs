//! Typed coercions from sub-expressions to values.
//!
//! Most coercions go through [`map_value`]: an atom first gets a cheap
//! literal reading for the target kind, and anything else (or an atom whose
//! literal reading fails) is evaluated recursively as a `Core` command.

use std::collections::BTreeMap;

use scenario_core::Expression;
use tracing::debug;

use crate::core_value;
use crate::dispatch::get_fetcher_value;
use crate::error::EvalError;
use crate::fetcher::{BoxFuture, Coercer};
use crate::numeric;
use crate::value::{Value, ValueKind};
use crate::world::World;

/// Literal reading of an atom for one target kind.
pub type LiteralParser = fn(&World, &str) -> Result<Value, EvalError>;

type Coerced<'a> = BoxFuture<'a, Result<Value, EvalError>>;

/// Dual-parse an expression into a value of kind `expected`.
///
/// A successful literal reading is returned without a tag check. When both
/// readings fail, the literal error wins: for an atom it is the more useful
/// message (`abc` is "not a number" rather than "unknown command").
pub async fn map_value(
    world: &mut World,
    expr: &Expression,
    literal: LiteralParser,
    complex: Coercer,
    expected: ValueKind,
) -> Result<Value, EvalError> {
    let mut literal_err = None;
    if let Expression::Atom(text) = expr {
        match literal(world, text) {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!(%text, %expected, error = %err, "literal reading failed, evaluating");
                literal_err = Some(err);
            }
        }
    }

    let value = match complex(world, expr).await {
        Ok(value) => value,
        Err(complex_err) => return Err(literal_err.unwrap_or(complex_err)),
    };

    if !expected.accepts(&value) {
        return Err(EvalError::TypeMismatch {
            expected,
            expression: expr.to_string(),
            actual: value.to_string(),
        });
    }
    Ok(value)
}

// ──────────────────────────────────────────────
// Literal readers
// ──────────────────────────────────────────────

fn literal_bool(_world: &World, text: &str) -> Result<Value, EvalError> {
    let lower = text.trim().to_ascii_lowercase();
    Ok(Value::Bool(matches!(lower.as_str(), "true" | "t" | "1")))
}

fn literal_number(_world: &World, text: &str) -> Result<Value, EvalError> {
    numeric::parse_number(text)
        .map(Value::Number)
        .map_err(|reason| EvalError::Literal {
            expected: ValueKind::Number,
            text: text.to_string(),
            reason,
        })
}

fn literal_string(_world: &World, text: &str) -> Result<Value, EvalError> {
    Ok(Value::String(text.to_string()))
}

fn literal_address(world: &World, text: &str) -> Result<Value, EvalError> {
    world
        .resolve_address(text)
        .map(Value::Address)
        .ok_or_else(|| EvalError::Literal {
            expected: ValueKind::Address,
            text: text.to_string(),
            reason: "not an address or known alias".to_string(),
        })
}

// ──────────────────────────────────────────────
// Coercers
// ──────────────────────────────────────────────

/// Defer: wrap the expression unevaluated.
pub fn get_event_v<'a>(_world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    Box::pin(async move { Ok(Value::Event(expr.clone())) })
}

/// Evaluate as a `Core` command.
pub fn get_core_value<'a>(world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    Box::pin(async move {
        let registry = core_value::registry()?;
        get_fetcher_value(registry, world, expr).await
    })
}

pub fn get_bool_v<'a>(world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    let kind = ValueKind::Bool;
    Box::pin(map_value(world, expr, literal_bool, get_core_value, kind))
}

pub fn get_number_v<'a>(world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    let kind = ValueKind::Number;
    Box::pin(map_value(world, expr, literal_number, get_core_value, kind))
}

/// A number multiplied by the world's fixed-point scale.
pub fn get_exp_number_v<'a>(world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    Box::pin(async move {
        let value = get_number_v(world, expr).await?;
        let n = value.as_number().ok_or_else(|| EvalError::TypeMismatch {
            expected: ValueKind::Number,
            expression: expr.to_string(),
            actual: value.to_string(),
        })?;
        let scaled = numeric::to_scaled(n, world.mantissa_decimals());
        Ok(Value::Scaled(scaled))
    })
}

/// A scaled number tagged as a percentage.
pub fn get_percent_v<'a>(world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    Box::pin(async move {
        match get_exp_number_v(world, expr).await? {
            Value::Scaled(n) => Ok(Value::Percent(n)),
            other => Ok(other),
        }
    })
}

pub fn get_string_v<'a>(world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    let kind = ValueKind::String;
    Box::pin(map_value(world, expr, literal_string, get_core_value, kind))
}

/// Evaluate as a `Core` command, promoting a string result to an address.
fn core_as_address<'a>(world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    Box::pin(async move {
        match get_core_value(world, expr).await? {
            Value::String(s) => Ok(Value::Address(s)),
            other => Ok(other),
        }
    })
}

pub fn get_address_v<'a>(world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    let kind = ValueKind::Address;
    let parse = map_value(world, expr, literal_address, core_as_address, kind);
    Box::pin(parse)
}

/// Read `(key value)` pairs into a map. Atom values are taken as strings;
/// list values are evaluated as `Core` commands, in textual order.
pub fn get_map_v<'a>(world: &'a mut World, expr: &'a Expression) -> Coerced<'a> {
    Box::pin(async move {
        let mut entries = BTreeMap::new();
        for pair in expr.items() {
            let (key, value_expr) = match pair.as_list() {
                Some([Expression::Atom(key), value]) => (key, value),
                _ => {
                    return Err(EvalError::TypeMismatch {
                        expected: ValueKind::Map,
                        expression: expr.to_string(),
                        actual: pair.to_string(),
                    })
                }
            };
            let value = match value_expr {
                Expression::Atom(text) => Value::String(text.clone()),
                list => get_core_value(world, list).await?,
            };
            entries.insert(key.clone(), value);
        }
        Ok(Value::Map(entries))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    const GEOFF: &str = "0x000000000000000000000000000000000000beef";

    fn world() -> World {
        World::offline("test").with_address("Geoff", GEOFF).unwrap()
    }

    fn atom(s: &str) -> Expression {
        Expression::atom(s)
    }

    fn num(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn bool_literals_never_fail() {
        let mut w = world();
        let cases = [
            ("true", true),
            (" T ", true),
            ("1", true),
            ("yes", false),
            ("0", false),
        ];
        for (text, expected) in cases {
            let value = get_bool_v(&mut w, &atom(text)).await.unwrap();
            assert_eq!(value, Value::Bool(expected), "{text}");
        }
    }

    #[tokio::test]
    async fn number_literal_error_beats_unknown_command() {
        let mut w = world();
        let expr = atom("NotANumberOrCommand");
        let err = get_number_v(&mut w, &expr).await.unwrap_err();
        assert_eq!(
            err,
            EvalError::Literal {
                expected: ValueKind::Number,
                text: "NotANumberOrCommand".into(),
                reason: "not a number".into(),
            }
        );
    }

    #[tokio::test]
    async fn atom_falls_back_to_core_command() {
        let mut w = world();
        let v = get_number_v(&mut w, &atom("Zero")).await.unwrap();
        assert_eq!(v, Value::Number(BigDecimal::from(0)));
    }

    #[tokio::test]
    async fn recursive_result_must_match_kind() {
        let mut w = world();
        let err = get_number_v(&mut w, &atom("True")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected Number from True, got: Bool(true)"
        );
    }

    #[tokio::test]
    async fn exp_number_scales_by_mantissa() {
        let mut w = world();
        assert_eq!(
            get_exp_number_v(&mut w, &atom("1")).await.unwrap(),
            Value::Scaled(num("1e18"))
        );
        let mut small = World::offline("test").with_mantissa_decimals(6);
        assert_eq!(
            get_exp_number_v(&mut small, &atom("2.5")).await.unwrap(),
            Value::Scaled(num("2500000"))
        );
        assert_eq!(
            get_percent_v(&mut w, &atom("0.5")).await.unwrap(),
            Value::Percent(num("5e17"))
        );
    }

    #[tokio::test]
    async fn string_literal_is_verbatim() {
        let mut w = world();
        assert_eq!(
            get_string_v(&mut w, &atom("hello")).await.unwrap(),
            Value::String("hello".into())
        );
    }

    #[tokio::test]
    async fn address_literals_and_aliases() {
        let mut w = world();
        assert_eq!(
            get_address_v(&mut w, &atom("geoff")).await.unwrap(),
            Value::Address(GEOFF.into())
        );
        let err = get_address_v(&mut w, &atom("Torrey")).await.unwrap_err();
        assert!(matches!(
            err,
            EvalError::Literal {
                expected: ValueKind::Address,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn address_promotes_string_results() {
        let mut w = world();
        let expr = Expression::list(vec![atom("String"), atom(GEOFF)]);
        assert_eq!(
            get_address_v(&mut w, &expr).await.unwrap(),
            Value::Address(GEOFF.into())
        );
    }

    #[tokio::test]
    async fn map_reads_pairs() {
        let mut w = world();
        let expr = Expression::list(vec![
            Expression::list(vec![atom("name"), atom("Geoff")]),
            Expression::list(vec![
                atom("amount"),
                Expression::list(vec![atom("Exactly"), atom("5")]),
            ]),
        ]);
        let mut expected = BTreeMap::new();
        expected.insert("name".to_string(), Value::String("Geoff".into()));
        expected.insert("amount".to_string(), Value::Number(BigDecimal::from(5)));
        let value = get_map_v(&mut w, &expr).await.unwrap();
        assert_eq!(value, Value::Map(expected));
    }

    #[tokio::test]
    async fn map_rejects_malformed_pairs() {
        let mut w = world();
        let expr = Expression::list(vec![Expression::list(vec![atom("lonely")])]);
        assert!(matches!(
            get_map_v(&mut w, &expr).await.unwrap_err(),
            EvalError::TypeMismatch {
                expected: ValueKind::Map,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn event_defers_evaluation() {
        let mut w = world();
        let expr = Expression::list(vec![atom("NoSuchCommand")]);
        assert_eq!(
            get_event_v(&mut w, &expr).await.unwrap(),
            Value::Event(expr.clone())
        );
    }
}
