// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::fmt;

use anyhow::Context;
use oracle_client::{Network, OracleConfig};
use tracing::Level;

use crate::args::OracleArgs;

#[derive(clap::ValueEnum, Debug, Clone)]
pub(crate) enum LogFormat {
    Json,
    Plain,
    Coloured,
}

#[derive(clap::ValueEnum, Debug, Clone)]
pub(crate) enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,
    /// Designates lower priority information.
    Debug,
    /// Designates useful information.
    Info,
    /// Designates hazardous situations.
    Warn,
    /// Designates very serious errors.
    Error,
}

/// Build the client configuration from the config file, if any, and the
/// command line overrides.
///
/// The signing key is moved out of the arguments, not copied.
pub(crate) fn oracle_config(
    args: &mut OracleArgs,
) -> anyhow::Result<OracleConfig> {
    let network = args
        .network
        .as_deref()
        .map(str::parse::<Network>)
        .transpose()?;

    let mut config = match (&args.config, &args.contract_id) {
        (Some(path), _) => OracleConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, Some(contract_id)) => {
            OracleConfig::new(network.unwrap_or_default(), contract_id)
        }
        (None, None) => {
            anyhow::bail!("either --config or --contract-id is required")
        }
    };

    if let Some(network) = network {
        config.network = network;
    }
    if let Some(contract_id) = &args.contract_id {
        config.contract_id = contract_id.clone();
    }
    if let Some(url) = &args.rpc_url {
        config.rpc_url = Some(url.clone());
    }
    if let Some(passphrase) = &args.network_passphrase {
        config.network_passphrase = Some(passphrase.clone());
    }
    if let Some(seed) = args.signing_key.take() {
        config.signing_key = Some(seed);
    }
    if let Some(base_fee) = args.base_fee {
        config.base_fee = base_fee;
    }

    config.validate()?;
    Ok(config)
}

impl From<&LogLevel> for Level {
    fn from(level: &LogLevel) -> Level {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Json => "json",
                Self::Plain => "plain",
                Self::Coloured => "coloured",
            }
        )
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Trace => "trace",
                Self::Debug => "debug",
                Self::Info => "info",
                Self::Warn => "warn",
                Self::Error => "error",
            }
        )
    }
}
