//! Named, ordered fetcher tables.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::error::{EvalError, RegistryError};
use crate::fetcher::Fetcher;

/// An ordered set of fetchers under one namespace.
///
/// Registration order is the overload resolution order: when several
/// fetchers share a name, the first whose arguments coerce wins.
#[derive(Clone)]
pub struct Registry {
    namespace: String,
    fetchers: Vec<Fetcher>,
}

impl Registry {
    /// Build a registry, validating every fetcher's argument list.
    pub fn new(
        namespace: impl Into<String>,
        fetchers: Vec<Fetcher>,
    ) -> Result<Self, RegistryError> {
        let namespace = namespace.into();
        for fetcher in &fetchers {
            validate(&namespace, fetcher)?;
        }
        Ok(Registry {
            namespace,
            fetchers,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn fetchers(&self) -> &[Fetcher] {
        &self.fetchers
    }

    /// Fetchers whose name matches `name` case-insensitively, in
    /// registration order.
    pub fn candidates<'r>(&'r self, name: &'r str) -> impl Iterator<Item = &'r Fetcher> + 'r {
        self.fetchers.iter().filter(move |f| f.matches_name(name))
    }

    /// Markdown listing of every command, nested namespaces included.
    pub fn help(&self) -> Result<String, EvalError> {
        let mut out = String::new();
        self.write_help(&mut out, 2)?;
        Ok(out)
    }

    /// Help for every overload named `name`, or `None` if there is none.
    pub fn help_for(&self, name: &str) -> Result<Option<String>, EvalError> {
        let mut out = String::new();
        for fetcher in self.candidates(name) {
            write_fetcher(&mut out, fetcher, 2)?;
        }
        Ok(if out.is_empty() { None } else { Some(out) })
    }

    fn write_help(&self, out: &mut String, depth: usize) -> Result<(), EvalError> {
        let _ = writeln!(out, "{} {}\n", "#".repeat(depth - 1), self.namespace);
        for fetcher in &self.fetchers {
            write_fetcher(out, fetcher, depth)?;
        }
        Ok(())
    }
}

fn write_fetcher(out: &mut String, fetcher: &Fetcher, depth: usize) -> Result<(), EvalError> {
    let _ = writeln!(out, "{} `{}`\n", "#".repeat(depth), fetcher.signature());
    if !fetcher.documentation().is_empty() {
        let _ = writeln!(out, "{}\n", fetcher.documentation());
    }
    if let Some(sub) = fetcher.sub_registry() {
        sub()?.write_help(out, depth + 1)?;
    }
    Ok(())
}

fn validate(namespace: &str, fetcher: &Fetcher) -> Result<(), RegistryError> {
    let command = fetcher.name().to_string();
    if command.trim().is_empty() {
        return Err(RegistryError::EmptyName {
            namespace: namespace.to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut defaulted = false;
    let last = fetcher.args().len().saturating_sub(1);
    for (i, arg) in fetcher.args().iter().enumerate() {
        let err_arg = arg.name.to_string();
        if !seen.insert(arg.name) {
            return Err(RegistryError::DuplicateArgument {
                namespace: namespace.to_string(),
                command,
                arg: err_arg,
            });
        }
        if arg.variadic && i != last {
            return Err(RegistryError::VariadicNotLast {
                namespace: namespace.to_string(),
                command,
                arg: err_arg,
            });
        }
        if arg.variadic && arg.default.is_some() {
            return Err(RegistryError::VariadicDefault {
                namespace: namespace.to_string(),
                command,
                arg: err_arg,
            });
        }
        if arg.default.is_some() {
            defaulted = true;
        } else if defaulted && !arg.variadic {
            return Err(RegistryError::RequiredAfterDefault {
                namespace: namespace.to_string(),
                command,
                arg: err_arg,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{Arg, Args, BoxFuture};
    use crate::value::Value;
    use crate::world::World;
    use scenario_core::Expression;
    use std::sync::OnceLock;

    fn any<'a>(_w: &'a mut World, _e: &'a Expression) -> BoxFuture<'a, Result<Value, EvalError>> {
        Box::pin(async { Ok(Value::Anything) })
    }

    fn unit<'a>(_w: &'a mut World, _a: Args) -> BoxFuture<'a, Result<Value, EvalError>> {
        Box::pin(async { Ok(Value::Nothing) })
    }

    #[test]
    fn candidates_match_case_insensitively_in_order() {
        let reg = Registry::new(
            "Test",
            vec![
                Fetcher::new("Pick", unit).arg(Arg::new("a", any)),
                Fetcher::new("Other", unit),
                Fetcher::new("PICK", unit),
            ],
        )
        .unwrap();
        let sigs: Vec<String> = reg.candidates("pick").map(|f| f.signature()).collect();
        assert_eq!(sigs, vec!["Pick a", "PICK"]);
        assert_eq!(reg.candidates("missing").count(), 0);
    }

    #[test]
    fn rejects_variadic_before_last() {
        let err = Registry::new(
            "Test",
            vec![Fetcher::new("Bad", unit)
                .arg(Arg::new("rest", any).variadic())
                .arg(Arg::new("tail", any))],
        )
        .err()
        .unwrap();
        assert!(matches!(err, RegistryError::VariadicNotLast { .. }));
    }

    #[test]
    fn rejects_two_variadics() {
        let err = Registry::new(
            "Test",
            vec![Fetcher::new("Bad", unit)
                .arg(Arg::new("a", any).variadic())
                .arg(Arg::new("b", any).variadic())],
        )
        .err()
        .unwrap();
        assert!(matches!(err, RegistryError::VariadicNotLast { .. }));
    }

    #[test]
    fn rejects_duplicate_and_misordered_defaults() {
        let dup = Registry::new(
            "Test",
            vec![Fetcher::new("Bad", unit)
                .arg(Arg::new("a", any))
                .arg(Arg::new("a", any))],
        )
        .err()
        .unwrap();
        assert!(matches!(dup, RegistryError::DuplicateArgument { .. }));

        let order = Registry::new(
            "Test",
            vec![Fetcher::new("Bad", unit)
                .arg(Arg::new("a", any).default(Value::Nothing))
                .arg(Arg::new("b", any))],
        )
        .err()
        .unwrap();
        assert_eq!(
            order.to_string(),
            "Test Bad: required argument `b` follows a defaulted argument"
        );

        let arg = Arg::new("a", any).variadic().default(Value::Nothing);
        let fetcher = Fetcher::new("Bad", unit).arg(arg);
        let err = Registry::new("Test", vec![fetcher]).err().unwrap();
        assert!(matches!(err, RegistryError::VariadicDefault { .. }));
    }

    #[test]
    fn rejects_empty_name() {
        let blank = Fetcher::new("  ", unit);
        let err = Registry::new("Test", vec![blank]).err().unwrap();
        assert_eq!(
            err,
            RegistryError::EmptyName {
                namespace: "Test".into(),
            }
        );
    }

    fn nested() -> Result<&'static Registry, EvalError> {
        static INNER: OnceLock<Result<Registry, RegistryError>> = OnceLock::new();
        INNER
            .get_or_init(|| {
                let leaf = Fetcher::new("Leaf", unit).doc("A leaf.");
                Registry::new("Inner", vec![leaf])
            })
            .as_ref()
            .map_err(|e| EvalError::Registry(e.clone()))
    }

    #[test]
    fn help_includes_docs_and_nested_namespaces() {
        let reg = Registry::new(
            "Outer",
            vec![Fetcher::new("Inner", unit)
                .doc("Nested commands.")
                .arg(Arg::new("res", any).variadic())
                .sub_expressions(nested)],
        )
        .unwrap();
        let help = reg.help().unwrap();
        assert!(help.starts_with("# Outer"));
        assert!(help.contains("## `Inner ...res`"));
        assert!(help.contains("Nested commands."));
        assert!(help.contains("## Inner"));
        assert!(help.contains("### `Leaf`"));
        assert!(help.contains("A leaf."));
        assert!(reg.help_for("inner").unwrap().is_some());
        assert!(reg.help_for("nope").unwrap().is_none());
    }
}
