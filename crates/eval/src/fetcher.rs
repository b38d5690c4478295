//! Command descriptors: argument specs, fetchers and the argument record
//! handed to resolvers.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use bigdecimal::BigDecimal;
use scenario_core::Expression;

use crate::error::EvalError;
use crate::registry::Registry;
use crate::value::{Value, ValueKind};
use crate::world::World;

/// Boxed future returned by coercions and resolvers. Boxing breaks the
/// recursion between dispatch and coercion.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns one sub-expression into a value.
pub type Coercer =
    for<'a> fn(&'a mut World, &'a Expression) -> BoxFuture<'a, Result<Value, EvalError>>;

/// Produces a fetcher's result from its coerced arguments.
pub type Resolver = for<'a> fn(&'a mut World, Args) -> BoxFuture<'a, Result<Value, EvalError>>;

/// Lazily resolves a nested registry.
pub type RegistryRef = fn() -> Result<&'static Registry, EvalError>;

// ──────────────────────────────────────────────
// Argument specs
// ──────────────────────────────────────────────

/// One positional parameter of a fetcher.
#[derive(Clone)]
pub struct Arg {
    pub name: &'static str,
    pub coerce: Coercer,
    /// Consumes every remaining sub-expression.
    pub variadic: bool,
    /// Coerces each consumed expression on its own.
    pub mapped: bool,
    /// Used when a trailing argument is omitted.
    pub default: Option<Value>,
}

impl Arg {
    pub fn new(name: &'static str, coerce: Coercer) -> Self {
        Arg {
            name,
            coerce,
            variadic: false,
            mapped: false,
            default: None,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn mapped(mut self) -> Self {
        self.mapped = true;
        self
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn signature(&self) -> String {
        match (self.variadic, self.mapped, &self.default) {
            (true, _, _) => format!("...{}", self.name),
            (false, true, _) => format!("({}...)", self.name),
            (false, false, Some(_)) => format!("[{}]", self.name),
            (false, false, None) => self.name.to_string(),
        }
    }
}

// ──────────────────────────────────────────────
// Argument record
// ──────────────────────────────────────────────

/// A coerced argument: one value, or one per consumed expression for
/// mapped specs.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    One(Value),
    Many(Vec<Value>),
}

/// Named arguments passed to a resolver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: BTreeMap<&'static str, ArgValue>,
}

fn wrong_kind(name: &str, expected: ValueKind, actual: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected,
        expression: format!("argument {}", name),
        actual: actual.to_string(),
    }
}

impl Args {
    pub fn insert(&mut self, name: &'static str, value: ArgValue) {
        self.values.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn entry(&self, name: &str) -> Result<&ArgValue, EvalError> {
        self.values
            .get(name)
            .ok_or_else(|| EvalError::MissingArgument {
                name: name.to_string(),
            })
    }

    /// The single value stored under `name`.
    pub fn value(&self, name: &str) -> Result<&Value, EvalError> {
        match self.entry(name)? {
            ArgValue::One(v) => Ok(v),
            ArgValue::Many(_) => Err(EvalError::TypeMismatch {
                expected: ValueKind::Anything,
                expression: format!("argument {}", name),
                actual: "a mapped argument list".to_string(),
            }),
        }
    }

    /// The values stored under a mapped argument.
    pub fn values(&self, name: &str) -> Result<&[Value], EvalError> {
        match self.entry(name)? {
            ArgValue::Many(vs) => Ok(vs),
            ArgValue::One(v) => Ok(std::slice::from_ref(v)),
        }
    }

    /// Remove and return an argument; mapped arguments come back as a list.
    pub fn take(&mut self, name: &str) -> Result<Value, EvalError> {
        match self.values.remove(name) {
            Some(ArgValue::One(v)) => Ok(v),
            Some(ArgValue::Many(vs)) => Ok(Value::List(vs)),
            None => Err(EvalError::MissingArgument {
                name: name.to_string(),
            }),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, EvalError> {
        match self.value(name)? {
            Value::Bool(b) => Ok(*b),
            other => Err(wrong_kind(name, ValueKind::Bool, other)),
        }
    }

    pub fn number(&self, name: &str) -> Result<&BigDecimal, EvalError> {
        let v = self.value(name)?;
        v.as_number()
            .ok_or_else(|| wrong_kind(name, ValueKind::Number, v))
    }

    pub fn string(&self, name: &str) -> Result<&str, EvalError> {
        match self.value(name)? {
            Value::String(s) => Ok(s),
            other => Err(wrong_kind(name, ValueKind::String, other)),
        }
    }

    pub fn address(&self, name: &str) -> Result<&str, EvalError> {
        match self.value(name)? {
            Value::Address(a) => Ok(a),
            other => Err(wrong_kind(name, ValueKind::Address, other)),
        }
    }

    /// The deferred expression of an event-wrapped argument.
    pub fn event(&self, name: &str) -> Result<&Expression, EvalError> {
        match self.value(name)? {
            Value::Event(e) => Ok(e),
            other => Err(wrong_kind(name, ValueKind::Event, other)),
        }
    }
}

// ──────────────────────────────────────────────
// Fetchers
// ──────────────────────────────────────────────

/// A registrable named command.
#[derive(Clone)]
pub struct Fetcher {
    pub(crate) name: String,
    pub(crate) doc: String,
    pub(crate) args: Vec<Arg>,
    pub(crate) resolve: Resolver,
    pub(crate) sub_registry: Option<RegistryRef>,
}

impl Fetcher {
    pub fn new(name: impl Into<String>, resolve: Resolver) -> Self {
        Fetcher {
            name: name.into(),
            doc: String::new(),
            args: Vec::new(),
            resolve,
            sub_registry: None,
        }
    }

    /// Markdown documentation shown by `help`.
    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = doc.trim().to_string();
        self
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Declare the nested vocabulary this command dispatches into.
    pub fn sub_expressions(mut self, registry: RegistryRef) -> Self {
        self.sub_registry = Some(registry);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.doc
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn sub_registry(&self) -> Option<RegistryRef> {
        self.sub_registry
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// `Name arg [opt] (mapped...) ...rest`
    pub fn signature(&self) -> String {
        let mut sig = self.name.clone();
        for arg in &self.args {
            sig.push(' ');
            sig.push_str(&arg.signature());
        }
        sig
    }

    /// Check whether `given` sub-expressions fit this fetcher's arity.
    pub fn check_arity(&self, given: usize) -> Result<(), EvalError> {
        let required = self
            .args
            .iter()
            .filter(|a| !a.variadic && a.default.is_none())
            .count();
        let positional = self.args.iter().filter(|a| !a.variadic).count();
        let variadic = self.args.iter().any(|a| a.variadic);

        let fits = if variadic {
            given >= required
        } else {
            given >= required && given <= positional
        };
        if fits {
            return Ok(());
        }
        let expected = if variadic {
            format!("at least {}", required)
        } else if required == positional {
            required.to_string()
        } else {
            format!("{} to {}", required, positional)
        };
        Err(EvalError::Arity { expected, given })
    }

    /// Coerce sub-expressions left to right into the argument record.
    ///
    /// Each coercion is awaited before the next starts, so side effects on
    /// the world follow textual order.
    pub async fn parse_args(
        &self,
        world: &mut World,
        exprs: &[Expression],
    ) -> Result<Args, EvalError> {
        self.check_arity(exprs.len())?;
        let mut args = Args::default();
        let mut rest = exprs;

        for arg in &self.args {
            if arg.variadic {
                let value = if arg.mapped {
                    let mut values = Vec::with_capacity(rest.len());
                    for expr in rest {
                        values.push((arg.coerce)(world, expr).await?);
                    }
                    ArgValue::Many(values)
                } else {
                    let unit = Expression::List(rest.to_vec());
                    ArgValue::One((arg.coerce)(world, &unit).await?)
                };
                args.insert(arg.name, value);
                rest = &[];
                continue;
            }

            match rest.split_first() {
                Some((expr, tail)) => {
                    let value = if arg.mapped {
                        let mut values = Vec::new();
                        for item in expr.items() {
                            values.push((arg.coerce)(world, item).await?);
                        }
                        ArgValue::Many(values)
                    } else {
                        ArgValue::One((arg.coerce)(world, expr).await?)
                    };
                    args.insert(arg.name, value);
                    rest = tail;
                }
                None => match &arg.default {
                    Some(default) => args.insert(arg.name, ArgValue::One(default.clone())),
                    None => {
                        return Err(EvalError::MissingArgument {
                            name: arg.name.to_string(),
                        })
                    }
                },
            }
        }
        Ok(args)
    }

    /// Invoke the resolver. Errors propagate unchanged.
    pub async fn resolve(&self, world: &mut World, args: Args) -> Result<Value, EvalError> {
        (self.resolve)(world, args).await
    }
}
