// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::path::PathBuf;

use clap::Parser;
use oracle_client::SecretSeed;
use url::Url;

use crate::settings::{LogFormat, LogLevel};
use crate::Command;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Query and feed a SEP-40 price oracle contract on Soroban."
)]
pub(crate) struct OracleArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Network to connect to [standalone, futurenet, testnet, public, custom]
    #[arg(short, long)]
    pub network: Option<String>,

    /// Strkey of the oracle contract
    #[arg(long)]
    pub contract_id: Option<String>,

    /// RPC server fully qualified URL, for the custom network
    #[arg(long)]
    pub rpc_url: Option<Url>,

    /// Network passphrase, for the custom network
    #[arg(long)]
    pub network_passphrase: Option<String>,

    /// Secret seed of the signing account
    #[arg(long, env = "ORACLE_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: Option<SecretSeed>,

    /// Inclusion fee offered per transaction, in stroops
    #[arg(long)]
    pub base_fee: Option<u32>,

    /// Output log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Logging output type
    #[arg(long, value_enum, default_value_t = LogFormat::Coloured)]
    pub log_type: LogFormat,

    /// Command
    #[command(subcommand)]
    pub command: Command,
}
