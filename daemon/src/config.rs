//! Daemon settings: an optional TOML file overlaid by CLI flags and
//! environment variables.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use custody_types::{NetworkId, ParseError};
use custody_utils::LogFormat;
use custody_wallet_core::{ConfigError, LedgerConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("network must be set to \"mainnet\" or \"testnet\"")]
    MissingNetwork,

    #[error(transparent)]
    Network(#[from] ParseError),

    #[error(transparent)]
    Ledger(#[from] ConfigError),
}

/// Settings as they appear in the TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub network: Option<String>,
    pub horizon_url: Option<String>,
    pub network_passphrase: Option<String>,
    pub listen: Option<SocketAddr>,
    pub log_format: Option<LogFormat>,
    pub log_level: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, DaemonConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DaemonConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Values given on the command line or through the environment. These win
/// over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub network: Option<String>,
    pub horizon_url: Option<String>,
    pub network_passphrase: Option<String>,
    pub listen: Option<SocketAddr>,
    pub log_format: Option<LogFormat>,
    pub log_level: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub ledger: LedgerConfig,
    pub listen: SocketAddr,
    pub log_format: LogFormat,
    pub log_level: String,
}

impl DaemonConfig {
    /// Merge `overrides` over `file` and validate the result.
    ///
    /// The network, ledger URL and passphrase have no defaults.
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self, DaemonConfigError> {
        let network: NetworkId = overrides
            .network
            .or(file.network)
            .ok_or(DaemonConfigError::MissingNetwork)?
            .parse()?;

        let mut ledger = LedgerConfig::new(
            network,
            overrides.horizon_url.or(file.horizon_url).unwrap_or_default(),
            overrides
                .network_passphrase
                .or(file.network_passphrase)
                .unwrap_or_default(),
        );
        if let Some(secs) = file.request_timeout_secs {
            ledger.request_timeout_secs = secs;
        }
        if let Some(secs) = file.connect_timeout_secs {
            ledger.connect_timeout_secs = secs;
        }
        ledger.validate()?;

        Ok(Self {
            ledger,
            listen: overrides.listen.or(file.listen).unwrap_or_else(default_listen),
            log_format: overrides.log_format.or(file.log_format).unwrap_or_default(),
            log_level: overrides
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
