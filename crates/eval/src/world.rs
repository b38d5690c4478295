//! Execution context shared by every resolver in a scenario run.
//!
//! A `World` is created once per run and passed by `&mut` through the
//! whole recursive evaluation of each command. Evaluation is sequential,
//! so resolvers may read and record state (last contract, last invocation)
//! without locking; side effects happen in textual argument order.

use std::collections::BTreeMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::client::{RemoteClient, StaticClient};
use crate::error::EvalError;
use crate::numeric::DEFAULT_MANTISSA_DECIMALS;
use crate::value::ZERO_ADDRESS;

/// Receipt of a completed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub gas_used: BigDecimal,
}

/// Record of the most recent invocation against the remote system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub function: String,
    pub receipt: Option<Receipt>,
}

/// Canonical form of an address literal: `0x` followed by 40 lowercase
/// hex digits. Returns `None` for anything else.
pub fn canonical_address(text: &str) -> Option<String> {
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))?;
    if hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("0x{}", hex.to_ascii_lowercase()))
    } else {
        None
    }
}

pub struct World {
    network: String,
    addresses: BTreeMap<String, String>,
    last_contract: Option<String>,
    last_invocation: Option<Invocation>,
    client: Arc<dyn RemoteClient>,
    mantissa_decimals: u32,
    fixed_now: Option<i64>,
}

impl World {
    pub fn new(network: impl Into<String>, client: Arc<dyn RemoteClient>) -> Self {
        World {
            network: network.into(),
            addresses: BTreeMap::new(),
            last_contract: None,
            last_invocation: None,
            client,
            mantissa_decimals: DEFAULT_MANTISSA_DECIMALS,
            fixed_now: None,
        }
    }

    /// A world backed by an empty [`StaticClient`].
    pub fn offline(network: impl Into<String>) -> Self {
        World::new(network, Arc::new(StaticClient::new()))
    }

    /// Register an address alias. Aliases match case-insensitively.
    pub fn add_address(&mut self, alias: &str, address: &str) -> Result<(), EvalError> {
        let canonical = canonical_address(address).ok_or_else(|| EvalError::Config {
            message: format!("invalid address for alias '{}': {}", alias, address),
        })?;
        self.addresses.insert(alias.to_ascii_lowercase(), canonical);
        Ok(())
    }

    pub fn with_address(mut self, alias: &str, address: &str) -> Result<Self, EvalError> {
        self.add_address(alias, address)?;
        Ok(self)
    }

    /// Replace the remote client, keeping all other state.
    pub fn with_client(mut self, client: Arc<dyn RemoteClient>) -> Self {
        self.client = client;
        self
    }

    pub fn with_mantissa_decimals(mut self, decimals: u32) -> Self {
        self.mantissa_decimals = decimals;
        self
    }

    /// Pin the clock used by time-relative commands.
    pub fn with_fixed_now(mut self, unix_seconds: i64) -> Self {
        self.fixed_now = Some(unix_seconds);
        self
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Resolve `zero`, a literal address, or a registered alias.
    pub fn resolve_address(&self, name: &str) -> Option<String> {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("zero") {
            return Some(ZERO_ADDRESS.to_string());
        }
        let alias = trimmed.to_ascii_lowercase();
        canonical_address(trimmed).or_else(|| self.addresses.get(&alias).cloned())
    }

    pub fn addresses(&self) -> &BTreeMap<String, String> {
        &self.addresses
    }

    pub fn record_contract(&mut self, address: impl Into<String>) {
        self.last_contract = Some(address.into());
    }

    pub fn last_contract(&self) -> Option<&str> {
        self.last_contract.as_deref()
    }

    pub fn record_invocation(&mut self, invocation: Invocation) {
        self.last_invocation = Some(invocation);
    }

    pub fn last_invocation(&self) -> Option<&Invocation> {
        self.last_invocation.as_ref()
    }

    /// Handle to the remote client. Cloned so callers can await on it
    /// while still holding `&mut World`.
    pub fn client(&self) -> Arc<dyn RemoteClient> {
        Arc::clone(&self.client)
    }

    /// Fixed-point scale exponent used by scaled numbers.
    pub fn mantissa_decimals(&self) -> u32 {
        self.mantissa_decimals
    }

    /// Current unix time in seconds, or the pinned value.
    pub fn now(&self) -> i64 {
        self.fixed_now
            .unwrap_or_else(|| time::OffsetDateTime::now_utc().unix_timestamp())
    }
}
