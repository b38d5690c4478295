//! Scenario expression evaluator -- resolves expression trees to tagged
//! values by matching them against registries of named commands.
//!
//! An expression is dispatched against the `Core` registry: its head names
//! a command, and each sub-expression is coerced into a typed argument
//! (often by recursing into dispatch) before the command's resolver runs.
//! Commands such as `Erc20` are namespaces whose arguments dispatch into a
//! nested registry.

pub mod client;
pub mod coerce;
pub mod config;
pub mod core_value;
pub mod dispatch;
pub mod erc20;
pub mod error;
pub mod fetcher;
pub mod numeric;
pub mod registry;
pub mod value;
pub mod world;

pub use client::{ClientError, RemoteClient, StaticClient};
pub use config::WorldConfig;
pub use dispatch::get_fetcher_value;
pub use error::{EvalError, RegistryError};
pub use fetcher::{Arg, ArgValue, Args, BoxFuture, Coercer, Fetcher, Resolver};
pub use registry::Registry;
pub use value::{Value, ValueKind};
pub use world::{Invocation, Receipt, World};

use scenario_core::Expression;

/// Evaluate an expression as a `Core` command.
pub async fn evaluate(world: &mut World, expr: &Expression) -> Result<Value, EvalError> {
    coerce::get_core_value(world, expr).await
}

/// Read one scenario line and evaluate it.
///
/// ```no_run
/// # async fn demo() -> Result<(), scenario_eval::EvalError> {
/// let mut world = scenario_eval::World::offline("development");
/// let value = scenario_eval::evaluate_str(&mut world, "Equal (Exactly 0) Zero").await?;
/// assert_eq!(value, scenario_eval::Value::Bool(true));
/// # Ok(())
/// # }
/// ```
pub async fn evaluate_str(world: &mut World, src: &str) -> Result<Value, EvalError> {
    let expr = scenario_core::parse_command(src)?;
    evaluate(world, &expr).await
}
