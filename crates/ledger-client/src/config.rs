use std::path::Path;

use ledger_types::AccountId;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Gas limit used for contract create and call unless a request overrides it.
pub const DEFAULT_CONTRACT_GAS: u64 = 5_000_000;

pub const DEFAULT_NODE_ACCOUNT_ID: AccountId = AccountId::from_num(3);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Client configuration.
///
/// ```toml
/// node_account_id = "0.0.3"
/// contract_gas = 5000000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(deserialize_with = "deserialize_account_id")]
    pub node_account_id: AccountId,
    pub contract_gas: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_account_id: DEFAULT_NODE_ACCOUNT_ID,
            contract_gas: DEFAULT_CONTRACT_GAS,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_gas == 0 {
            return Err(ConfigError::Invalid(
                "contract_gas must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn deserialize_account_id<'de, D>(deserializer: D) -> Result<AccountId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
