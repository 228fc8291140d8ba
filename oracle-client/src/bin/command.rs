// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use oracle_client::native::decode;
use oracle_client::{Asset, Fixed18, OracleClient, PriceUpdate, WireValue};
use serde::Deserialize;
use serde_json::{json, Value};

/// An asset given by code, with an optional issuer or contract address
#[derive(Args, Clone, Debug)]
pub(crate) struct AssetArg {
    /// Asset code, or symbol for assets living off chain
    pub code: String,

    /// Issuer (G...) or token contract (C...) address, `native` for the
    /// network asset
    #[arg(long)]
    pub address: Option<String>,
}

/// A line of a price file given to `add-prices`
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct PriceLine {
    pub source: u32,
    pub code: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Decimal price, as a string to keep every digit
    pub price: String,
    pub timestamp: u64,
}

/// Read a JSON array of [`PriceLine`]s.
pub(crate) fn read_prices(path: &Path) -> anyhow::Result<Vec<PriceLine>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let lines = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(lines)
}

/// Commands that can be run against the oracle contract
#[derive(Subcommand, Clone, Debug)]
pub(crate) enum Command {
    /// Set up the contract admin, base asset, decimals and resolution
    Initialize {
        /// Admin account
        admin: String,
        #[command(flatten)]
        base: AssetArg,
        /// Number of decimals of the prices
        decimals: u32,
        /// Seconds between two price updates
        resolution: u32,
    },

    /// Extend the time to live of the contract instance
    BumpInstance,

    /// Check whether an admin is set
    HasAdmin,

    /// Replace the contract admin
    WriteAdmin {
        /// New admin account
        admin: String,
    },

    /// Show the contract admin
    ReadAdmin,

    /// List the price sources
    Sources,

    /// Show the base asset
    Base,

    /// List the assets with prices
    Assets,

    /// Show the number of decimals of the prices
    Decimals,

    /// Show the seconds between two price updates
    Resolution,

    /// Show the latest price of an asset
    Lastprice {
        #[command(flatten)]
        asset: AssetArg,
    },

    /// Show the price of an asset at a given time
    Price {
        #[command(flatten)]
        asset: AssetArg,
        /// Unix timestamp, in seconds
        timestamp: u64,
    },

    /// Show the last prices of an asset
    Prices {
        #[command(flatten)]
        asset: AssetArg,
        /// Number of records
        records: u32,
    },

    /// Show the latest price of an asset from a source
    LastpriceBySource {
        /// Source identifier
        source: u32,
        #[command(flatten)]
        asset: AssetArg,
    },

    /// Show the price of an asset from a source at a given time
    PriceBySource {
        /// Source identifier
        source: u32,
        #[command(flatten)]
        asset: AssetArg,
        /// Unix timestamp, in seconds
        timestamp: u64,
    },

    /// Show the last prices of an asset from a source
    PricesBySource {
        /// Source identifier
        source: u32,
        #[command(flatten)]
        asset: AssetArg,
        /// Number of records
        records: u32,
    },

    /// Record a price
    AddPrice {
        /// Source identifier
        source: u32,
        #[command(flatten)]
        asset: AssetArg,
        /// Decimal price, up to 18 fractional digits
        price: Fixed18,
        /// Unix timestamp, in seconds
        timestamp: u64,
    },

    /// Record every price of a JSON file in a single transaction
    AddPrices {
        /// JSON array of `{source, code, address, price, timestamp}`
        file: PathBuf,
    },

    /// Decode a base64 XDR contract value
    Decode {
        /// Base64 XDR
        xdr: String,
    },

    /// Wait for the outcome of a submitted transaction
    Wait {
        /// Transaction hash
        hash: String,
    },
}

impl Command {
    /// Whether the command needs a configured client
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Run a command that needs no network access.
    pub fn run_offline(&self) -> anyhow::Result<Value> {
        match self {
            Self::Decode { xdr } => decode_xdr(xdr),
            _ => anyhow::bail!("command requires a network connection"),
        }
    }

    /// Run the command against the oracle and return its JSON output.
    pub async fn run(self, client: &OracleClient) -> anyhow::Result<Value> {
        let asset = |arg: &AssetArg| -> anyhow::Result<Asset> {
            Ok(client.asset(&arg.code, arg.address.as_deref())?)
        };

        let output = match self {
            Self::Initialize {
                admin,
                base,
                decimals,
                resolution,
            } => {
                let base = asset(&base)?;
                client
                    .initialize(&admin, &base, decimals, resolution)
                    .await?;
                Value::Null
            }
            Self::BumpInstance => {
                client.bump_instance().await?;
                Value::Null
            }
            Self::HasAdmin => json!(client.has_admin().await?),
            Self::WriteAdmin { admin } => {
                client.write_admin(&admin).await?;
                Value::Null
            }
            Self::ReadAdmin => json!(client.read_admin().await?),
            Self::Sources => json!(client.sources().await?),
            Self::Base => json!(client.base().await?),
            Self::Assets => json!(client.assets().await?),
            Self::Decimals => json!(client.decimals().await?),
            Self::Resolution => json!(client.resolution().await?),
            Self::Lastprice { asset: arg } => {
                json!(client.lastprice(&asset(&arg)?).await?)
            }
            Self::Price {
                asset: arg,
                timestamp,
            } => json!(client.price(&asset(&arg)?, timestamp).await?),
            Self::Prices { asset: arg, records } => {
                json!(client.prices(&asset(&arg)?, records).await?)
            }
            Self::LastpriceBySource { source, asset: arg } => {
                json!(client.lastprice_by_source(source, &asset(&arg)?).await?)
            }
            Self::PriceBySource {
                source,
                asset: arg,
                timestamp,
            } => json!(
                client
                    .price_by_source(source, &asset(&arg)?, timestamp)
                    .await?
            ),
            Self::PricesBySource {
                source,
                asset: arg,
                records,
            } => json!(
                client
                    .prices_by_source(source, &asset(&arg)?, records)
                    .await?
            ),
            Self::AddPrice {
                source,
                asset: arg,
                price,
                timestamp,
            } => {
                client
                    .add_price(source, &asset(&arg)?, price, timestamp)
                    .await?;
                Value::Null
            }
            Self::AddPrices { file } => {
                let prices = read_prices(&file)?
                    .into_iter()
                    .map(|line| -> anyhow::Result<PriceUpdate> {
                        Ok(PriceUpdate {
                            source: line.source,
                            asset: client
                                .asset(&line.code, line.address.as_deref())?,
                            price: line.price.parse::<Fixed18>()?,
                            timestamp: line.timestamp,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                client.add_prices(&prices).await?;
                Value::Null
            }
            Self::Wait { hash } => {
                serde_json::to_value(client.wait_for(&hash).await?)?
            }
            Self::Decode { xdr } => decode_xdr(&xdr)?,
        };

        Ok(output)
    }
}

fn decode_xdr(xdr: &str) -> anyhow::Result<Value> {
    let value = WireValue::from_xdr_base64(xdr)?;
    Ok(serde_json::to_value(decode(&value)?)?)
}
