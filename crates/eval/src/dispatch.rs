//! Overload resolution: pick a fetcher by name, coerce its arguments,
//! and run its resolver.

use scenario_core::Expression;
use tracing::{debug, trace};

use crate::error::EvalError;
use crate::fetcher::BoxFuture;
use crate::registry::Registry;
use crate::value::Value;
use crate::world::World;

/// Split an expression into command name and argument expressions.
///
/// A bare atom is a zero-argument command.
fn split_command<'e>(
    registry: &Registry,
    expr: &'e Expression,
) -> Result<(&'e str, &'e [Expression]), EvalError> {
    match expr {
        Expression::Atom(name) => Ok((name.as_str(), &[])),
        Expression::List(items) => match items.split_first() {
            Some((Expression::Atom(name), rest)) => Ok((name.as_str(), rest)),
            _ => Err(EvalError::InvalidExpression {
                namespace: registry.namespace().to_string(),
                expression: expr.to_string(),
            }),
        },
    }
}

/// Evaluate `expr` against `registry`.
///
/// Candidates are tried in registration order. An overload is rejected when
/// its arity does not fit or an argument fails to coerce; the first overload
/// whose arguments all coerce is selected and its resolver's result (or
/// error) is returned unchanged. If every candidate is rejected, the error
/// lists each attempted signature with the last rejection as its cause.
pub fn get_fetcher_value<'a>(
    registry: &'a Registry,
    world: &'a mut World,
    expr: &'a Expression,
) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        let (name, rest) = split_command(registry, expr)?;
        let candidates: Vec<_> = registry.candidates(name).collect();
        if candidates.is_empty() {
            return Err(EvalError::UnknownCommand {
                namespace: registry.namespace().to_string(),
                name: name.to_string(),
            });
        }

        let mut signatures = Vec::with_capacity(candidates.len());
        let mut last_failure = None;
        for fetcher in candidates {
            let signature = fetcher.signature();
            trace!(namespace = registry.namespace(), %signature, "trying overload");
            signatures.push(signature);

            match fetcher.parse_args(world, rest).await {
                Ok(args) => {
                    debug!(
                        namespace = registry.namespace(),
                        command = fetcher.name(),
                        args = args.len(),
                        "selected fetcher"
                    );
                    return fetcher.resolve(world, args).await;
                }
                Err(err) => {
                    trace!(namespace = registry.namespace(), error = %err, "overload rejected");
                    last_failure = Some(err);
                }
            }
        }

        let cause = last_failure.unwrap_or(EvalError::Arity {
            expected: "a matching overload".to_string(),
            given: rest.len(),
        });
        Err(EvalError::ArgumentMismatch {
            namespace: registry.namespace().to_string(),
            name: name.to_string(),
            expression: expr.to_string(),
            signatures,
            cause: Box::new(cause),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{get_number_v, get_string_v};
    use crate::error::RegistryError;
    use crate::fetcher::{Arg, Args, Fetcher};
    use bigdecimal::BigDecimal;
    use scenario_core::parse_command;
    use std::sync::OnceLock;

    fn one<'a>(_w: &'a mut World, _a: Args) -> BoxFuture<'a, Result<Value, EvalError>> {
        Box::pin(async { Ok(Value::String("one".into())) })
    }

    fn two<'a>(_w: &'a mut World, _a: Args) -> BoxFuture<'a, Result<Value, EvalError>> {
        Box::pin(async { Ok(Value::String("two".into())) })
    }

    fn sum<'a>(_w: &'a mut World, a: Args) -> BoxFuture<'a, Result<Value, EvalError>> {
        Box::pin(async move {
            let total = a.number("a")? + a.number("b")?;
            Ok(Value::Number(total))
        })
    }

    fn boom<'a>(_w: &'a mut World, _a: Args) -> BoxFuture<'a, Result<Value, EvalError>> {
        Box::pin(async { Err(EvalError::precondition("resolver failed")) })
    }

    fn registry() -> &'static Registry {
        static REG: OnceLock<Result<Registry, RegistryError>> = OnceLock::new();
        REG.get_or_init(|| {
            Registry::new(
                "Test",
                vec![
                    Fetcher::new("Pick", one).arg(Arg::new("a", get_string_v)),
                    Fetcher::new("Pick", two)
                        .arg(Arg::new("a", get_string_v))
                        .arg(Arg::new("b", get_string_v)),
                    Fetcher::new("Sum", sum)
                        .arg(Arg::new("a", get_number_v))
                        .arg(Arg::new("b", get_number_v)),
                    Fetcher::new("Sum", one)
                        .arg(Arg::new("s", get_string_v))
                        .arg(Arg::new("t", get_string_v)),
                    Fetcher::new("Boom", boom),
                    Fetcher::new("Boom", one),
                ],
            )
        })
        .as_ref()
        .unwrap()
    }

    async fn eval(src: &str) -> Result<Value, EvalError> {
        let mut world = World::offline("test");
        let expr = parse_command(src).unwrap();
        get_fetcher_value(registry(), &mut world, &expr).await
    }

    #[tokio::test]
    async fn overloads_selected_by_arity() {
        assert_eq!(eval("Pick x").await.unwrap(), Value::String("one".into()));
        assert_eq!(eval("Pick x y").await.unwrap(), Value::String("two".into()));
    }

    #[tokio::test]
    async fn no_fitting_arity_is_argument_mismatch() {
        for src in ["Pick", "Pick x y z"] {
            match eval(src).await.unwrap_err() {
                EvalError::ArgumentMismatch {
                    name, signatures, ..
                } => {
                    assert_eq!(name, "Pick");
                    assert_eq!(signatures, vec!["Pick a", "Pick a b"]);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn coercion_failure_falls_through_to_next_overload() {
        assert_eq!(
            eval("Sum 1 2").await.unwrap(),
            Value::Number(BigDecimal::from(3))
        );
        assert_eq!(eval("Sum x 2").await.unwrap(), Value::String("one".into()));
    }

    #[tokio::test]
    async fn resolver_errors_are_not_retried() {
        assert_eq!(
            eval("Boom").await.unwrap_err(),
            EvalError::precondition("resolver failed")
        );
    }

    #[tokio::test]
    async fn unknown_and_malformed_commands() {
        assert_eq!(
            eval("Nope").await.unwrap_err(),
            EvalError::UnknownCommand {
                namespace: "Test".into(),
                name: "Nope".into(),
            }
        );
        let mut world = World::offline("test");
        let empty = Expression::List(vec![]);
        assert!(matches!(
            get_fetcher_value(registry(), &mut world, &empty).await,
            Err(EvalError::InvalidExpression { .. })
        ));
    }

    #[tokio::test]
    async fn names_match_case_insensitively() {
        assert_eq!(eval("pICK x").await.unwrap(), Value::String("one".into()));
    }
}
