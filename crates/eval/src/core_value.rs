//! The `Core` namespace: constants, literal wrappers, context queries,
//! collections, time helpers, assertions and nested domain namespaces.

use std::sync::OnceLock;

use bigdecimal::BigDecimal;

use crate::coerce::{
    get_address_v, get_core_value, get_event_v, get_exp_number_v, get_map_v, get_number_v,
    get_percent_v, get_string_v,
};
use crate::erc20;
use crate::error::{EvalError, RegistryError};
use crate::fetcher::{Arg, Args, BoxFuture, Fetcher};
use crate::numeric;
use crate::registry::Registry;
use crate::value::{Value, ValueKind};
use crate::world::World;

type Resolved<'a> = BoxFuture<'a, Result<Value, EvalError>>;

fn number(text: &str) -> Result<Value, EvalError> {
    numeric::parse_number(text)
        .map(Value::Number)
        .map_err(|reason| EvalError::Literal {
            expected: ValueKind::Number,
            text: text.to_string(),
            reason,
        })
}

// ──────────────────────────────────────────────
// Constants
// ──────────────────────────────────────────────

fn resolve_true<'a>(_w: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async { Ok(Value::Bool(true)) })
}

fn resolve_false<'a>(_w: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async { Ok(Value::Bool(false)) })
}

fn resolve_zero<'a>(_w: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async { number("0") })
}

fn resolve_max<'a>(_w: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async { number(numeric::MAX_UINT256) })
}

fn resolve_some<'a>(_w: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async { number("100e18") })
}

fn resolve_little<'a>(_w: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async { number("100e10") })
}

fn resolve_anything<'a>(_w: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async { Ok(Value::Anything) })
}

fn resolve_nothing<'a>(_w: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async { Ok(Value::Nothing) })
}

// ──────────────────────────────────────────────
// Literal wrappers
// ──────────────────────────────────────────────

// These take their argument deferred and coerce it themselves, so the
// wrapper decides how an atom is read.

fn resolve_exactly<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let amt = args.event("amt")?;
        get_number_v(world, amt).await
    })
}

fn resolve_string<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let text = args.event("str")?;
        get_string_v(world, text).await
    })
}

fn resolve_exp<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let amt = args.event("amt")?;
        get_exp_number_v(world, amt).await
    })
}

fn resolve_percent<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let amt = args.event("amt")?;
        get_percent_v(world, amt).await
    })
}

fn resolve_neg<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let amt = args.event("amt")?;
        let value = get_number_v(world, amt).await?;
        match value.as_number() {
            Some(n) => Ok(Value::Number(BigDecimal::from(0) - n)),
            None => Err(EvalError::TypeMismatch {
                expected: ValueKind::Number,
                expression: amt.to_string(),
                actual: value.to_string(),
            }),
        }
    })
}

fn resolve_precisely<'a>(_w: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let text = args.string("amt")?;
        let value = numeric::parse_decimal(text).map_err(|reason| EvalError::Literal {
            expected: ValueKind::PreciseNumber,
            text: text.to_string(),
            reason,
        })?;
        Ok(Value::Precise {
            value,
            sig_figs: numeric::sig_figs(text),
        })
    })
}

fn resolve_address<'a>(_w: &'a mut World, mut args: Args) -> Resolved<'a> {
    Box::pin(async move { args.take("addr") })
}

// ──────────────────────────────────────────────
// Context queries
// ──────────────────────────────────────────────

fn resolve_last_contract<'a>(world: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async move {
        let Some(address) = world.last_contract() else {
            let msg = "Expected a last contract but none found.";
            return Err(EvalError::precondition(msg));
        };
        Ok(Value::Address(address.to_string()))
    })
}

fn resolve_last_gas<'a>(world: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async move {
        let Some(invocation) = world.last_invocation() else {
            let msg = "Expected last invocation for LastGas but none found.";
            return Err(EvalError::precondition(msg));
        };
        let Some(receipt) = invocation.receipt.as_ref() else {
            return Err(EvalError::precondition(format!(
                "Expected last invocation ({}) to have a receipt for LastGas but none found.",
                invocation.function
            )));
        };
        Ok(Value::Number(receipt.gas_used.clone()))
    })
}

fn resolve_network<'a>(world: &'a mut World, _a: Args) -> Resolved<'a> {
    Box::pin(async move {
        let network = world.network().to_string();
        Ok(Value::String(network))
    })
}

fn resolve_ether_balance<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let address = args.address("address")?;
        let balance = world.client().balance(address).await?;
        Ok(Value::Number(balance))
    })
}

// ──────────────────────────────────────────────
// Collections and control
// ──────────────────────────────────────────────

fn resolve_list<'a>(_w: &'a mut World, mut args: Args) -> Resolved<'a> {
    Box::pin(async move { args.take("els") })
}

fn resolve_map<'a>(_w: &'a mut World, mut args: Args) -> Resolved<'a> {
    Box::pin(async move { args.take("pairs") })
}

fn resolve_default<'a>(world: &'a mut World, mut args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let val = args.take("val")?;
        if val.truthy() {
            return Ok(val);
        }
        let fallback = args.event("def")?;
        get_core_value(world, fallback).await
    })
}

fn resolve_equal<'a>(_w: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let given = args.value("given")?;
        let expected = args.value("expected")?;
        Ok(Value::Bool(expected.compare_to(given)))
    })
}

// ──────────────────────────────────────────────
// Time
// ──────────────────────────────────────────────

fn seconds(args: &Args, name: &str, unit: u64) -> Result<Value, EvalError> {
    let n = args.number(name)? * BigDecimal::from(unit);
    Ok(Value::Number(numeric::round_to_integer(&n)))
}

fn resolve_minutes<'a>(_w: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move { seconds(&args, "minutes", 60) })
}

fn resolve_hours<'a>(_w: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move { seconds(&args, "hours", 3_600) })
}

fn resolve_days<'a>(_w: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move { seconds(&args, "days", 86_400) })
}

fn resolve_weeks<'a>(_w: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move { seconds(&args, "weeks", 604_800) })
}

fn resolve_years<'a>(_w: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move { seconds(&args, "years", 31_536_000) })
}

fn resolve_from_now<'a>(world: &'a mut World, args: Args) -> Resolved<'a> {
    Box::pin(async move {
        let offset = args.number("seconds")?;
        let at = offset + BigDecimal::from(world.now());
        Ok(Value::Number(numeric::round_to_integer(&at)))
    })
}

// ──────────────────────────────────────────────
// Namespaces
// ──────────────────────────────────────────────

fn resolve_namespace<'a>(_w: &'a mut World, mut args: Args) -> Resolved<'a> {
    Box::pin(async move { args.take("res") })
}

// ──────────────────────────────────────────────
// Registry
// ──────────────────────────────────────────────

fn core_fetchers() -> Vec<Fetcher> {
    vec![
        Fetcher::new("True", resolve_true).doc("Boolean true."),
        Fetcher::new("False", resolve_false).doc("Boolean false."),
        Fetcher::new("Zero", resolve_zero).doc("The number 0."),
        Fetcher::new("Max", resolve_max).doc("The largest unsigned 256-bit integer, 2^256 - 1."),
        Fetcher::new("Some", resolve_some).doc("A generous amount: 100e18."),
        Fetcher::new("Little", resolve_little).doc("A small amount: 100e10."),
        Fetcher::new("Exactly", resolve_exactly)
            .doc("The given number, e.g. `Exactly 1.5`.")
            .arg(Arg::new("amt", get_event_v)),
        Fetcher::new("Hex", resolve_string)
            .doc("A hex string, kept verbatim, e.g. `Hex 0xffff`.")
            .arg(Arg::new("str", get_event_v)),
        Fetcher::new("String", resolve_string)
            .doc("A string, kept verbatim.")
            .arg(Arg::new("str", get_event_v)),
        Fetcher::new("Exp", resolve_exp)
            .doc("A number scaled by the mantissa, e.g. `Exp 1.5` is 1.5e18.")
            .arg(Arg::new("amt", get_event_v)),
        Fetcher::new("Percent", resolve_percent)
            .doc("A percentage as a scaled number, e.g. `Percent 0.5`.")
            .arg(Arg::new("amt", get_event_v)),
        Fetcher::new("Neg", resolve_neg)
            .doc("The negation of a number.")
            .arg(Arg::new("amt", get_event_v)),
        Fetcher::new("Precisely", resolve_precisely)
            .doc(
                "A number that compares equal only up to its written significant \
                 figures, e.g. `Precisely 5.1000` matches 5.10004.",
            )
            .arg(Arg::new("amt", get_string_v)),
        Fetcher::new("Anything", resolve_anything).doc("Matches any value in `Equal`."),
        Fetcher::new("Nothing", resolve_nothing).doc("Matches no value in `Equal`."),
        Fetcher::new("Address", resolve_address)
            .doc("An address literal, `zero`, or address book alias.")
            .arg(Arg::new("addr", get_address_v)),
        Fetcher::new("LastContract", resolve_last_contract)
            .doc("The address of the most recently deployed contract."),
        Fetcher::new("LastGas", resolve_last_gas)
            .doc("Gas used by the most recent invocation."),
        Fetcher::new("List", resolve_list)
            .doc("A list of values, e.g. `List (Exactly 1) True`.")
            .arg(Arg::new("els", get_core_value).variadic().mapped()),
        Fetcher::new("Map", resolve_map)
            .doc("A map from `(key value)` pairs, e.g. `Map (name Geoff)`.")
            .arg(Arg::new("pairs", get_map_v).variadic()),
        Fetcher::new("Default", resolve_default)
            .doc("`val` if truthy, otherwise the lazily evaluated `def`.")
            .arg(Arg::new("val", get_core_value))
            .arg(Arg::new("def", get_event_v)),
        Fetcher::new("Minutes", resolve_minutes)
            .doc("Minutes in seconds.")
            .arg(Arg::new("minutes", get_number_v)),
        Fetcher::new("Hours", resolve_hours)
            .doc("Hours in seconds.")
            .arg(Arg::new("hours", get_number_v)),
        Fetcher::new("Days", resolve_days)
            .doc("Days in seconds.")
            .arg(Arg::new("days", get_number_v)),
        Fetcher::new("Weeks", resolve_weeks)
            .doc("Weeks in seconds.")
            .arg(Arg::new("weeks", get_number_v)),
        Fetcher::new("Years", resolve_years)
            .doc("365-day years in seconds.")
            .arg(Arg::new("years", get_number_v)),
        Fetcher::new("FromNow", resolve_from_now)
            .doc("Unix time `seconds` from now, e.g. `FromNow (Days 2)`.")
            .arg(Arg::new("seconds", get_number_v)),
        Fetcher::new("Network", resolve_network).doc("The configured network name."),
        Fetcher::new("EtherBalance", resolve_ether_balance)
            .doc("Native balance of an address.")
            .arg(Arg::new("address", get_address_v)),
        Fetcher::new("Equal", resolve_equal)
            .doc("Whether `given` matches `expected`.")
            .arg(Arg::new("given", get_core_value))
            .arg(Arg::new("expected", get_core_value)),
        Fetcher::new("Erc20", resolve_namespace)
            .doc("ERC-20 token reads, e.g. `Erc20 TotalSupply ZRX`.")
            .arg(Arg::new("res", erc20::get_erc20_value).variadic())
            .sub_expressions(erc20::registry),
    ]
}

static CORE: OnceLock<Result<Registry, RegistryError>> = OnceLock::new();

/// The `Core` registry, built on first use.
pub fn registry() -> Result<&'static Registry, EvalError> {
    CORE.get_or_init(|| Registry::new("Core", core_fetchers()))
        .as_ref()
        .map_err(|e| EvalError::Registry(e.clone()))
}
