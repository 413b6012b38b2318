//! Configuration for the ledger

use crate::types::{AccountId, TokenInfo};
use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Token identity
    pub token: TokenConfig,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: TokenConfig::default(),
            actor: ActorConfig::default(),
            metrics: MetricsConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

/// Token identity, fixed for the lifetime of a ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Ticker symbol
    pub symbol: String,

    /// Human readable name
    pub name: String,

    /// Minting authority
    pub owner: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            symbol: "CLR".to_string(),
            name: "Asset Token".to_string(),
            owner: "owner".to_string(),
        }
    }
}

impl TokenConfig {
    /// Token info with the owner as an [`AccountId`]
    pub fn token_info(&self) -> TokenInfo {
        TokenInfo {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            owner: AccountId::new(self.owner.clone()),
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Attach Prometheus collectors to the ledger
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(symbol) = std::env::var("LEDGER_TOKEN_SYMBOL") {
            config.token.symbol = symbol;
        }

        if let Ok(name) = std::env::var("LEDGER_TOKEN_NAME") {
            config.token.name = name;
        }

        if let Ok(owner) = std::env::var("LEDGER_OWNER") {
            config.token.owner = owner;
        }

        if let Ok(capacity) = std::env::var("LEDGER_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid LEDGER_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        if let Ok(filter) = std::env::var("LEDGER_LOG_FILTER") {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the ledger cannot start with
    pub fn validate(&self) -> crate::Result<()> {
        if self.token.symbol.trim().is_empty() {
            return Err(crate::Error::Config("Token symbol must not be empty".to_string()));
        }
        if self.token.owner.trim().is_empty() {
            return Err(crate::Error::Config("Owner must not be empty".to_string()));
        }
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "Mailbox capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.token.symbol, "CLR");
        assert_eq!(config.token.name, "Asset Token");
        assert_eq!(config.actor.mailbox_capacity, 1000);
        assert!(config.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_with_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_filter = "debug"

[token]
symbol = "GLD"
owner = "0xa11ce"

[actor]
mailbox_capacity = 16
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.token.symbol, "GLD");
        assert_eq!(config.token.name, "Asset Token");
        assert_eq!(config.token.token_info().owner, AccountId::new("0xa11ce"));
        assert_eq!(config.actor.mailbox_capacity, 16);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_from_file_rejects_zero_mailbox() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[actor]\nmailbox_capacity = 0").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Mailbox capacity"));
    }

    #[test]
    fn test_validate_rejects_empty_owner() {
        let mut config = Config::default();
        config.token.owner = "  ".to_string();
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }
}
