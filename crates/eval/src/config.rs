//! World configuration loaded from TOML or JSON.
//!
//! ```toml
//! network = "development"
//! mantissa_decimals = 18
//!
//! [addresses]
//! Geoff = "0x000000000000000000000000000000000000beef"
//! ZRX = "0x00000000000000000000000000000000000000aa"
//!
//! [fixtures.balances]
//! Geoff = "5000000000000000000"
//!
//! [[fixtures.calls]]
//! address = "ZRX"
//! method = "totalSupply"
//! result = "1000"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::client::StaticClient;
use crate::error::EvalError;
use crate::numeric::{self, DEFAULT_MANTISSA_DECIMALS};
use crate::world::World;

fn default_network() -> String {
    "development".to_string()
}

fn default_mantissa_decimals() -> u32 {
    DEFAULT_MANTISSA_DECIMALS
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_network")]
    pub network: String,
    /// Alias -> address.
    #[serde(default)]
    pub addresses: BTreeMap<String, String>,
    #[serde(default = "default_mantissa_decimals")]
    pub mantissa_decimals: u32,
    /// Pinned unix time for `FromNow`.
    #[serde(default)]
    pub now: Option<i64>,
    #[serde(default)]
    pub fixtures: Fixtures,
}

/// Canned answers for the static client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
    /// Address or alias -> decimal balance.
    #[serde(default)]
    pub balances: BTreeMap<String, String>,
    #[serde(default)]
    pub calls: Vec<CallFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallFixture {
    /// Address or alias of the called contract.
    pub address: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub result: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            network: default_network(),
            addresses: BTreeMap::new(),
            mantissa_decimals: DEFAULT_MANTISSA_DECIMALS,
            now: None,
            fixtures: Fixtures::default(),
        }
    }
}

fn config_err(message: impl Into<String>) -> EvalError {
    EvalError::Config {
        message: message.into(),
    }
}

impl WorldConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, EvalError> {
        toml::from_str(src).map_err(|e| config_err(format!("invalid TOML: {}", e)))
    }

    pub fn from_json_str(src: &str) -> Result<Self, EvalError> {
        serde_json::from_str(src).map_err(|e| config_err(format!("invalid JSON: {}", e)))
    }

    /// Load by extension: `.json` is read as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self, EvalError> {
        let shown = path.display();
        let src = std::fs::read_to_string(path)
            .map_err(|e| config_err(format!("cannot read {shown}: {e}")))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&src),
            _ => Self::from_toml_str(&src),
        }
    }

    /// Build a world backed by a [`StaticClient`] loaded with the fixtures.
    pub fn into_world(self) -> Result<World, EvalError> {
        let decimals = self.mantissa_decimals;
        let mut world = World::offline(self.network).with_mantissa_decimals(decimals);
        for (alias, address) in &self.addresses {
            world.add_address(alias, address)?;
        }
        if let Some(now) = self.now {
            world = world.with_fixed_now(now);
        }

        let resolve = |name: &str| {
            world
                .resolve_address(name)
                .ok_or_else(|| config_err(format!("unknown address {name}")))
        };

        let mut client = StaticClient::new();
        for (name, amount) in &self.fixtures.balances {
            let address = resolve(name)?;
            let amount = numeric::parse_number(amount)
                .map_err(|e| config_err(format!("balance for {}: {}", name, e)))?;
            client = client.with_balance(&address, amount);
        }
        for call in &self.fixtures.calls {
            let address = resolve(&call.address)?;
            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(world.resolve_address(arg).unwrap_or_else(|| arg.clone()));
            }
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            client = client.with_call(&address, &call.method, &arg_refs, call.result.clone());
        }

        Ok(world.with_client(Arc::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
network = "kovan"

[addresses]
Geoff = "0x000000000000000000000000000000000000BEEF"
ZRX = "0x00000000000000000000000000000000000000aa"

[fixtures.balances]
Geoff = "5e18"

[[fixtures.calls]]
address = "ZRX"
method = "balanceOf"
args = ["Geoff"]
result = "12"
"#;

    #[test]
    fn parses_toml_with_defaults() {
        let config = WorldConfig::from_toml_str(TOML).unwrap();
        assert_eq!(config.network, "kovan");
        assert_eq!(config.mantissa_decimals, 18);
        assert_eq!(config.addresses.len(), 2);
        assert_eq!(config.fixtures.calls[0].args, vec!["Geoff".to_string()]);
    }

    #[test]
    fn parses_json() {
        let config = WorldConfig::from_json_str(r#"{"network": "mainnet", "now": 5}"#).unwrap();
        assert_eq!(config.network, "mainnet");
        assert_eq!(config.now, Some(5));
        assert!(config.addresses.is_empty());
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = WorldConfig::from_toml_str("network = ").unwrap_err();
        assert!(matches!(err, EvalError::Config { .. }));
    }

    #[tokio::test]
    async fn world_resolves_fixture_aliases() {
        let config = WorldConfig::from_toml_str(TOML).unwrap();
        let world = config.into_world().unwrap();
        assert_eq!(world.network(), "kovan");
        let geoff = world.resolve_address("Geoff").unwrap();
        let zrx = world.resolve_address("ZRX").unwrap();
        let client = world.client();
        assert_eq!(
            client.balance(&geoff).await.unwrap(),
            numeric::parse_number("5000000000000000000").unwrap()
        );
        assert_eq!(
            client.call(&zrx, "balanceOf", &[geoff]).await.unwrap(),
            "12"
        );
    }

    #[test]
    fn unknown_fixture_address_is_rejected() {
        let src = "[fixtures.balances]\nNobody = \"1\"\n";
        let err = WorldConfig::from_toml_str(src)
            .unwrap()
            .into_world()
            .err()
            .unwrap();
        assert!(err.to_string().contains("Nobody"));
    }
}
