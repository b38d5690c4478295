//! Remote system client capability.
//!
//! Resolvers that need external state (balances, contract reads) go through
//! a [`RemoteClient`] obtained from the [`World`](crate::World). The
//! transport behind it is not this crate's concern; [`StaticClient`]
//! answers from fixed fixtures for tests and offline runs.

use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors raised by a remote client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The client has no answer for this request.
    #[error("no {request} available for {target}")]
    Unavailable { request: String, target: String },

    /// The remote returned something the caller could not decode.
    #[error("malformed response from {method}: {response}")]
    Malformed { method: String, response: String },

    /// A transport-specific failure.
    #[error("remote client error: {0}")]
    Remote(String),
}

// ──────────────────────────────────────────────
// Trait
// ──────────────────────────────────────────────

/// Asynchronous access to the system under test.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Native balance held by `address`.
    async fn balance(&self, address: &str) -> Result<BigDecimal, ClientError>;

    /// Read-only call of `method` on the contract at `address`.
    ///
    /// Returns the raw textual result (decimal or `0x` hex for numbers).
    async fn call(
        &self,
        address: &str,
        method: &str,
        args: &[String],
    ) -> Result<String, ClientError>;
}

// ──────────────────────────────────────────────
// StaticClient
// ──────────────────────────────────────────────

/// A client that answers from fixed balances and call results.
///
/// Addresses are matched case-insensitively; method names and arguments
/// are matched exactly (arguments that look like addresses are lowercased).
#[derive(Debug, Clone, Default)]
pub struct StaticClient {
    balances: HashMap<String, BigDecimal>,
    calls: HashMap<(String, String, Vec<String>), String>,
}

fn normalize_arg(arg: &str) -> String {
    if arg.starts_with("0x") || arg.starts_with("0X") {
        arg.to_ascii_lowercase()
    } else {
        arg.to_string()
    }
}

impl StaticClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, address: &str, amount: BigDecimal) -> Self {
        self.balances.insert(address.to_ascii_lowercase(), amount);
        self
    }

    pub fn with_call(
        mut self,
        address: &str,
        method: &str,
        args: &[&str],
        result: impl Into<String>,
    ) -> Self {
        let key = (
            address.to_ascii_lowercase(),
            method.to_string(),
            args.iter().map(|a| normalize_arg(a)).collect(),
        );
        self.calls.insert(key, result.into());
        self
    }
}

#[async_trait]
impl RemoteClient for StaticClient {
    async fn balance(&self, address: &str) -> Result<BigDecimal, ClientError> {
        self.balances
            .get(&address.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| ClientError::Unavailable {
                request: "balance".to_string(),
                target: address.to_string(),
            })
    }

    async fn call(
        &self,
        address: &str,
        method: &str,
        args: &[String],
    ) -> Result<String, ClientError> {
        let key = (
            address.to_ascii_lowercase(),
            method.to_string(),
            args.iter().map(|a| normalize_arg(a)).collect::<Vec<_>>(),
        );
        self.calls
            .get(&key)
            .cloned()
            .ok_or_else(|| ClientError::Unavailable {
                request: format!("call {}({})", method, args.join(", ")),
                target: address.to_string(),
            })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0x00000000000000000000000000000000000000aa";

    #[tokio::test]
    async fn static_client_returns_balances_case_insensitively() {
        let client = StaticClient::new().with_balance(TOKEN, BigDecimal::from(42));
        let upper = TOKEN.to_ascii_uppercase().replacen("0X", "0x", 1);
        assert_eq!(client.balance(&upper).await.unwrap(), BigDecimal::from(42));
    }

    #[tokio::test]
    async fn static_client_matches_calls_by_method_and_args() {
        let client = StaticClient::new()
            .with_call(TOKEN, "totalSupply", &[], "1000")
            .with_call(TOKEN, "balanceOf", &["0xABC"], "7");
        assert_eq!(
            client.call(TOKEN, "totalSupply", &[]).await.unwrap(),
            "1000"
        );
        assert_eq!(
            client
                .call(TOKEN, "balanceOf", &["0xabc".to_string()])
                .await
                .unwrap(),
            "7"
        );
    }

    #[tokio::test]
    async fn missing_fixture_is_unavailable() {
        let client = StaticClient::new();
        let err = client.balance(TOKEN).await.unwrap_err();
        assert!(matches!(err, ClientError::Unavailable { .. }));
        assert_eq!(
            err.to_string(),
            format!("no balance available for {}", TOKEN)
        );
    }
}
