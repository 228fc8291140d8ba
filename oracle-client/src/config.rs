// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Client settings, loaded from TOML or built in code.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use std::{fs, io};

use serde::{Deserialize, Serialize};
use stellar_strkey::{ed25519, Contract};
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::submit::PollPolicy;

const fn default_base_fee() -> u32 {
    50_000
}
const fn default_tx_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Errors raised while loading or validating a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Cannot read config file {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML for this configuration
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Not a network preset name
    #[error("Unknown network {0:?}")]
    UnknownNetwork(String),
    /// The contract id is not a `C...` strkey
    #[error("Invalid contract id {0:?}")]
    InvalidContractId(String),
    /// The signing key is not an `S...` secret seed
    #[error("Invalid signing key")]
    InvalidSigningKey,
    /// A custom network lacks its RPC URL or passphrase
    #[error("The {network} network requires {field}")]
    MissingNetworkParameter {
        /// Network preset
        network: Network,
        /// Missing field
        field: &'static str,
    },
    /// A preset network was given an explicit RPC URL or passphrase
    #[error("{field} cannot be set for the {network} network")]
    PresetOverride {
        /// Network preset
        network: Network,
        /// Offending field
        field: &'static str,
    },
    /// The poll policy can never observe a transaction
    #[error("Invalid poll policy: {0}")]
    InvalidPollPolicy(&'static str),
}

/// Stellar networks with well-known endpoints
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Local quickstart node
    Standalone,
    /// Future protocol preview network
    Futurenet,
    /// Test network
    #[default]
    Testnet,
    /// Main network
    Public,
    /// Any other network, given by RPC URL and passphrase
    Custom,
}

impl Network {
    /// Default RPC endpoint of the preset
    pub const fn rpc_url(&self) -> Option<&'static str> {
        match self {
            Self::Standalone => Some("http://localhost:8000/soroban/rpc"),
            Self::Futurenet => Some("https://rpc-futurenet.stellar.org:443/"),
            Self::Testnet => Some("https://soroban-testnet.stellar.org:443/"),
            Self::Public => Some("https://rpc.stellar.org:443/"),
            Self::Custom => None,
        }
    }

    /// Passphrase of the preset
    pub const fn passphrase(&self) -> Option<&'static str> {
        match self {
            Self::Standalone => Some("Standalone Network ; February 2017"),
            Self::Futurenet => Some("Test SDF Future Network ; October 2022"),
            Self::Testnet => Some("Test SDF Network ; September 2015"),
            Self::Public => {
                Some("Public Global Stellar Network ; September 2015")
            }
            Self::Custom => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Standalone => "standalone",
            Self::Futurenet => "futurenet",
            Self::Testnet => "testnet",
            Self::Public => "public",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standalone" | "local" => Ok(Self::Standalone),
            "futurenet" => Ok(Self::Futurenet),
            "testnet" => Ok(Self::Testnet),
            "public" | "mainnet" => Ok(Self::Public),
            "custom" => Ok(Self::Custom),
            _ => Err(ConfigError::UnknownNetwork(s.to_string())),
        }
    }
}

/// An `S...` secret seed, kept out of debug output and serialization, and
/// wiped from memory on drop
#[derive(Clone, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretSeed(String);

impl SecretSeed {
    /// Wrap a secret seed strkey.
    pub fn new(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    /// The seed strkey.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretSeed {
    fn from(seed: String) -> Self {
        Self(seed)
    }
}

impl fmt::Debug for SecretSeed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("SecretSeed(***)")
    }
}

/// Settings of an [`OracleClient`](crate::OracleClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    /// Network preset
    #[serde(default)]
    pub network: Network,

    /// Strkey of the oracle contract
    pub contract_id: String,

    /// RPC endpoint, required for and restricted to the custom network
    #[serde(default)]
    pub rpc_url: Option<Url>,

    /// Network passphrase, required for and restricted to the custom network
    #[serde(default)]
    pub network_passphrase: Option<String>,

    /// Default key signing every submission
    #[serde(default, skip_serializing)]
    pub signing_key: Option<SecretSeed>,

    /// Inclusion fee offered per transaction, in stroops
    #[serde(default = "default_base_fee")]
    pub base_fee: u32,

    /// Validity window of a built transaction
    #[serde(with = "humantime_serde")]
    #[serde(default = "default_tx_timeout")]
    pub tx_timeout: Duration,

    /// How the outcome of a submission is awaited
    #[serde(default)]
    pub poll: PollPolicy,
}

impl OracleConfig {
    /// A configuration with every default for the given network.
    pub fn new(network: Network, contract_id: impl Into<String>) -> Self {
        Self {
            network,
            contract_id: contract_id.into(),
            rpc_url: None,
            network_passphrase: None,
            signing_key: None,
            base_fee: default_base_fee(),
            tx_timeout: default_tx_timeout(),
            poll: PollPolicy::default(),
        }
    }

    /// Attempt to load and validate the configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the RPC endpoint of a custom network.
    pub fn with_rpc_url(mut self, rpc_url: Url) -> Self {
        self.rpc_url = Some(rpc_url);
        self
    }

    /// Set the passphrase of a custom network.
    pub fn with_network_passphrase(
        mut self,
        passphrase: impl Into<String>,
    ) -> Self {
        self.network_passphrase = Some(passphrase.into());
        self
    }

    /// Set the default signing key.
    pub fn with_signing_key(mut self, seed: SecretSeed) -> Self {
        self.signing_key = Some(seed);
        self
    }

    /// Set the inclusion fee.
    pub const fn with_base_fee(mut self, base_fee: u32) -> Self {
        self.base_fee = base_fee;
        self
    }

    /// Set the transaction validity window.
    pub const fn with_tx_timeout(mut self, tx_timeout: Duration) -> Self {
        self.tx_timeout = tx_timeout;
        self
    }

    /// Set the poll policy.
    pub const fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Check every field, and that network parameters match the preset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Contract::from_string(&self.contract_id).map_err(|_| {
            ConfigError::InvalidContractId(self.contract_id.clone())
        })?;

        if let Some(seed) = &self.signing_key {
            ed25519::PrivateKey::from_string(seed.expose())
                .map_err(|_| ConfigError::InvalidSigningKey)?;
        }

        let network = self.network;
        match network {
            Network::Custom => {
                if self.rpc_url.is_none() {
                    return Err(ConfigError::MissingNetworkParameter {
                        network,
                        field: "rpc_url",
                    });
                }
                if self.network_passphrase.is_none() {
                    return Err(ConfigError::MissingNetworkParameter {
                        network,
                        field: "network_passphrase",
                    });
                }
            }
            _ => {
                if self.rpc_url.is_some() {
                    return Err(ConfigError::PresetOverride {
                        network,
                        field: "rpc_url",
                    });
                }
                if self.network_passphrase.is_some() {
                    return Err(ConfigError::PresetOverride {
                        network,
                        field: "network_passphrase",
                    });
                }
            }
        }

        self.poll.validate()
    }

    /// The RPC endpoint in use.
    pub fn rpc_url(&self) -> Result<Url, ConfigError> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        match self.network.rpc_url().map(Url::parse) {
            Some(Ok(url)) => Ok(url),
            _ => Err(ConfigError::MissingNetworkParameter {
                network: self.network,
                field: "rpc_url",
            }),
        }
    }

    /// The network passphrase in use.
    pub fn network_passphrase(&self) -> Result<&str, ConfigError> {
        self.network_passphrase
            .as_deref()
            .or(self.network.passphrase())
            .ok_or(ConfigError::MissingNetworkParameter {
                network: self.network,
                field: "network_passphrase",
            })
    }
}
