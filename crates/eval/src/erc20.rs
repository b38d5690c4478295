//! The `Erc20` namespace: read-only token queries, reached from `Core`
//! as `(Erc20 <Command> <token> ...)`.

use std::sync::OnceLock;

use scenario_core::Expression;

use crate::client::ClientError;
use crate::coerce::get_address_v;
use crate::dispatch::get_fetcher_value;
use crate::error::{EvalError, RegistryError};
use crate::fetcher::{Arg, Args, BoxFuture, Fetcher};
use crate::numeric;
use crate::registry::Registry;
use crate::value::Value;
use crate::world::World;

type Resolved<'a> = BoxFuture<'a, Result<Value, EvalError>>;

/// Evaluate an expression in the `Erc20` namespace.
pub fn get_erc20_value<'a>(world: &'a mut World, expr: &'a Expression) -> Resolved<'a> {
    Box::pin(async move {
        let registry = registry()?;
        get_fetcher_value(registry, world, expr).await
    })
}

async fn call(
    world: &World,
    token: &str,
    method: &str,
    args: &[&str],
) -> Result<String, EvalError> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    Ok(world.client().call(token, method, &args).await?)
}

async fn call_number(
    world: &World,
    token: &str,
    method: &str,
    args: &[&str],
) -> Result<Value, EvalError> {
    let raw = call(world, token, method, args).await?;
    let n = numeric::parse_number(&raw).map_err(|_| ClientError::Malformed {
        method: method.to_string(),
        response: raw.clone(),
    })?;
    Ok(Value::Number(n))
}

fn resolve_total_supply<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let token = args.address("token")?;
        call_number(world, token, "totalSupply", &[]).await
    })
}

fn resolve_token_balance<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let token = args.address("token")?;
        let owner = args.address("owner")?;
        call_number(world, token, "balanceOf", &[owner]).await
    })
}

fn resolve_allowance<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let token = args.address("token")?;
        let owner = args.address("owner")?;
        let spender = args.address("spender")?;
        call_number(world, token, "allowance", &[owner, spender]).await
    })
}

fn resolve_name<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let name = call(world, args.address("token")?, "name", &[]).await?;
        Ok(Value::String(name))
    })
}

fn resolve_symbol<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let symbol = call(world, args.address("token")?, "symbol", &[]).await?;
        Ok(Value::String(symbol))
    })
}

fn resolve_decimals<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let token = args.address("token")?;
        call_number(world, token, "decimals", &[]).await
    })
}

fn resolve_address<'a>(_w: &'a mut World, mut args: Args) -> Resolved<'a> {
    Box::pin(async move { args.take("token") })
}

fn token() -> Arg {
    Arg::new("token", get_address_v)
}

static ERC20: OnceLock<Result<Registry, RegistryError>> = OnceLock::new();

pub fn registry() -> Result<&'static Registry, EvalError> {
    ERC20
        .get_or_init(|| {
            Registry::new(
                "Erc20",
                vec![
                    Fetcher::new("TotalSupply", resolve_total_supply)
                        .doc("Total token supply, e.g. `Erc20 TotalSupply ZRX`.")
                        .arg(token()),
                    Fetcher::new("TokenBalance", resolve_token_balance)
                        .doc("Token balance of `owner`.")
                        .arg(token())
                        .arg(Arg::new("owner", get_address_v)),
                    Fetcher::new("Allowance", resolve_allowance)
                        .doc("Amount `spender` may transfer on behalf of `owner`.")
                        .arg(token())
                        .arg(Arg::new("owner", get_address_v))
                        .arg(Arg::new("spender", get_address_v)),
                    Fetcher::new("Name", resolve_name).arg(token()),
                    Fetcher::new("Symbol", resolve_symbol).arg(token()),
                    Fetcher::new("Decimals", resolve_decimals).arg(token()),
                    Fetcher::new("Address", resolve_address)
                        .doc("The token's address.")
                        .arg(token()),
                ],
            )
        })
        .as_ref()
        .map_err(|e| EvalError::Registry(e.clone()))
}
