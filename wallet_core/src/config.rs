//! Ledger connection settings.

use custody_types::NetworkId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("horizon_url must not be empty")]
    MissingHorizonUrl,

    #[error("horizon_url must be an http(s) URL: {0}")]
    InvalidHorizonUrl(String),

    #[error("network_passphrase must not be empty")]
    MissingPassphrase,

    #[error("failed to parse ledger config: {0}")]
    Parse(String),
}

/// Which network to talk to and how. Built once at startup and shared by
/// reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub network: NetworkId,

    /// Base URL of the ledger's HTTP API.
    pub horizon_url: String,

    /// Signing domain for the selected network.
    pub network_passphrase: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl LedgerConfig {
    pub fn new(
        network: NetworkId,
        horizon_url: impl Into<String>,
        network_passphrase: impl Into<String>,
    ) -> Self {
        Self {
            network,
            horizon_url: horizon_url.into(),
            network_passphrase: network_passphrase.into(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.horizon_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingHorizonUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidHorizonUrl(self.horizon_url.clone()));
        }
        if self.network_passphrase.is_empty() {
            return Err(ConfigError::MissingPassphrase);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml_with_defaults() {
        let config = LedgerConfig::from_toml_str(
            r#"
network = "testnet"
horizon_url = "https://api.testnet.minepi.com"
network_passphrase = "Pi Testnet"
"#,
        )
        .unwrap();
        assert_eq!(config.network, NetworkId::Testnet);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn unknown_network_fails_to_parse() {
        let err = LedgerConfig::from_toml_str(
            r#"
network = "devnet"
horizon_url = "https://example.org"
network_passphrase = "x"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validate_rejects_empty_values() {
        let mut config = LedgerConfig::new(NetworkId::Mainnet, "https://api.mainnet.minepi.com", "Pi Network");
        assert!(config.validate().is_ok());

        config.network_passphrase.clear();
        assert!(matches!(config.validate(), Err(ConfigError::MissingPassphrase)));

        config.network_passphrase = "Pi Network".into();
        config.horizon_url = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::MissingHorizonUrl)));

        config.horizon_url = "ftp://ledger".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHorizonUrl(_))));
    }
}
