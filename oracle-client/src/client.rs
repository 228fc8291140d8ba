// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Typed calls to every function of the oracle contract.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::asset::Asset;
use crate::bigint::Fixed18;
use crate::config::OracleConfig;
use crate::envelope::Invocation;
use crate::error::Error;
use crate::native::{list, optional, optional_list, NativeValue, PriceRecord};
use crate::rpc::RpcClient;
use crate::signer::{KeypairSigner, Signer};
use crate::submit::Submitter;
use crate::transport::Transport;
use crate::wire::{MapEntry, ScAddress, WireValue};

macro_rules! methods {
    ($($variant:ident => $name:literal,)*) => {
        /// Functions exposed by the oracle contract
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Method {
            $(
                #[allow(missing_docs)]
                $variant,
            )*
        }

        impl Method {
            /// Every method, in declaration order
            pub const ALL: &'static [Method] = &[$(Self::$variant,)*];

            /// Name of the contract function
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }

        impl FromStr for Method {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)*
                    _ => Err(Error::unexpected("oracle method", s)),
                }
            }
        }
    };
}

methods! {
    Initialize => "initialize",
    BumpInstance => "bump_instance",
    HasAdmin => "has_admin",
    WriteAdmin => "write_admin",
    ReadAdmin => "read_admin",
    Sources => "sources",
    PricesBySource => "prices_by_source",
    PriceBySource => "price_by_source",
    LastpriceBySource => "lastprice_by_source",
    AddPrice => "add_price",
    AddPrices => "add_prices",
    RemovePrices => "remove_prices",
    Base => "base",
    Assets => "assets",
    Decimals => "decimals",
    Resolution => "resolution",
    Price => "price",
    Prices => "prices",
    Lastprice => "lastprice",
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A price to record with [`OracleClient::add_prices`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceUpdate {
    /// Source identifier
    pub source: u32,
    /// Priced asset
    pub asset: Asset,
    /// Price, in base asset units
    pub price: Fixed18,
    /// Unix timestamp, in seconds
    pub timestamp: u64,
}

impl PriceUpdate {
    /// The `Price` struct of the contract: a map keyed by field name, keys in
    /// lexicographic order.
    pub fn to_wire(&self) -> Result<WireValue, Error> {
        let field = |name: &str, val: WireValue| {
            Ok::<_, Error>(MapEntry {
                key: WireValue::symbol(name)?,
                val,
            })
        };
        Ok(WireValue::Map(vec![
            field("asset", self.asset.to_wire()?)?,
            field("price", self.price.into())?,
            field("source", self.source.into())?,
            field("timestamp", self.timestamp.into())?,
        ]))
    }
}

/// Client of a SEP-40 price oracle contract
pub struct OracleClient<T = RpcClient> {
    submitter: Submitter<T>,
    contract: ScAddress,
    network_passphrase: String,
    signer: Option<Arc<dyn Signer>>,
    cancel: CancellationToken,
}

impl OracleClient<RpcClient> {
    /// Connect to the RPC server of the configured network.
    pub fn from_config(config: &OracleConfig) -> Result<Self, Error> {
        let transport = RpcClient::new(config.rpc_url()?)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> OracleClient<T> {
    /// Build a client over any transport.
    pub fn with_transport(
        config: &OracleConfig,
        transport: T,
    ) -> Result<Self, Error> {
        config.validate()?;

        let network_passphrase = config.network_passphrase()?.to_string();
        let contract = ScAddress::from_strkey(&config.contract_id)?;
        let signer = match &config.signing_key {
            Some(seed) => Some(Arc::new(KeypairSigner::from_secret(
                seed.expose(),
            )?) as Arc<dyn Signer>),
            None => None,
        };
        let submitter = Submitter::new(
            transport,
            network_passphrase.clone(),
            config.base_fee,
            config.tx_timeout,
            config.poll,
        );

        Ok(Self {
            submitter,
            contract,
            network_passphrase,
            signer,
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the default signer.
    pub fn with_signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Token aborting every pending wait of this client when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The submitter driving this client's invocations
    pub fn submitter(&self) -> &Submitter<T> {
        &self.submitter
    }

    /// Build an [`Asset`] on the client's network.
    pub fn asset(
        &self,
        code: &str,
        address: Option<&str>,
    ) -> Result<Asset, Error> {
        Ok(Asset::resolve(code, address, &self.network_passphrase)?)
    }

    /// Invoke a method with the default signer.
    pub async fn invoke(
        &self,
        method: Method,
        args: Vec<WireValue>,
    ) -> Result<NativeValue, Error> {
        let signer = self.signer.clone().ok_or(Error::MissingSigner)?;
        self.invoke_as(method, args, signer.as_ref()).await
    }

    /// Invoke a method with the given signer.
    pub async fn invoke_as(
        &self,
        method: Method,
        args: Vec<WireValue>,
        signer: &dyn Signer,
    ) -> Result<NativeValue, Error> {
        if method == Method::RemovePrices {
            return Err(Error::NotImplemented(Method::RemovePrices.as_str()));
        }
        let invocation = Invocation::new(self.contract, method.as_str(), args)?;
        self.submitter.submit(invocation, signer, &self.cancel).await
    }

    /// Wait again for the outcome of a submitted transaction.
    pub async fn wait_for(&self, hash: &str) -> Result<NativeValue, Error> {
        self.submitter.wait_for(hash, &self.cancel).await
    }

    /// Set up the contract. Can only be called once.
    pub async fn initialize(
        &self,
        admin: &str,
        base: &Asset,
        decimals: u32,
        resolution: u32,
    ) -> Result<(), Error> {
        let args = vec![
            WireValue::address(admin)?,
            base.to_wire()?,
            decimals.into(),
            resolution.into(),
        ];
        expect_unit(self.invoke(Method::Initialize, args).await?)
    }

    /// Extend the time to live of the contract instance.
    pub async fn bump_instance(&self) -> Result<(), Error> {
        expect_unit(self.invoke(Method::BumpInstance, vec![]).await?)
    }

    /// Whether an admin is set.
    pub async fn has_admin(&self) -> Result<bool, Error> {
        self.invoke(Method::HasAdmin, vec![]).await?.as_bool()
    }

    /// Replace the contract admin.
    pub async fn write_admin(&self, admin: &str) -> Result<(), Error> {
        let args = vec![WireValue::address(admin)?];
        expect_unit(self.invoke(Method::WriteAdmin, args).await?)
    }

    /// The contract admin.
    pub async fn read_admin(&self) -> Result<String, Error> {
        self.invoke(Method::ReadAdmin, vec![]).await?.into_address()
    }

    /// Identifiers of the price sources.
    pub async fn sources(&self) -> Result<Vec<u32>, Error> {
        list(self.invoke(Method::Sources, vec![]).await?)
    }

    /// The last `records` prices of an asset from a source.
    pub async fn prices_by_source(
        &self,
        source: u32,
        asset: &Asset,
        records: u32,
    ) -> Result<Option<Vec<PriceRecord>>, Error> {
        let args = vec![source.into(), asset.to_wire()?, records.into()];
        optional_list(self.invoke(Method::PricesBySource, args).await?)
    }

    /// The price of an asset from a source at a given time.
    pub async fn price_by_source(
        &self,
        source: u32,
        asset: &Asset,
        timestamp: u64,
    ) -> Result<Option<PriceRecord>, Error> {
        let args = vec![source.into(), asset.to_wire()?, timestamp.into()];
        optional(self.invoke(Method::PriceBySource, args).await?)
    }

    /// The latest price of an asset from a source.
    pub async fn lastprice_by_source(
        &self,
        source: u32,
        asset: &Asset,
    ) -> Result<Option<PriceRecord>, Error> {
        let args = vec![source.into(), asset.to_wire()?];
        optional(self.invoke(Method::LastpriceBySource, args).await?)
    }

    /// Record a price. Requires the admin signature.
    pub async fn add_price(
        &self,
        source: u32,
        asset: &Asset,
        price: Fixed18,
        timestamp: u64,
    ) -> Result<(), Error> {
        info!(source, %asset, %price, timestamp, "adding price");
        let args = vec![
            source.into(),
            asset.to_wire()?,
            price.into(),
            timestamp.into(),
        ];
        expect_unit(self.invoke(Method::AddPrice, args).await?)
    }

    /// Record several prices in a single transaction. Requires the admin
    /// signature.
    pub async fn add_prices(
        &self,
        prices: &[PriceUpdate],
    ) -> Result<(), Error> {
        info!(count = prices.len(), "adding prices");
        let prices = prices
            .iter()
            .map(PriceUpdate::to_wire)
            .collect::<Result<_, _>>()?;
        let args = vec![WireValue::Vec(prices)];
        expect_unit(self.invoke(Method::AddPrices, args).await?)
    }

    /// Remove prices of the given sources and assets in a time range.
    pub async fn remove_prices(
        &self,
        _sources: &[u32],
        _assets: &[Asset],
        _start_timestamp: u64,
        _end_timestamp: u64,
    ) -> Result<(), Error> {
        Err(Error::NotImplemented(Method::RemovePrices.as_str()))
    }

    /// The asset prices are quoted in.
    pub async fn base(&self) -> Result<Asset, Error> {
        Asset::try_from(self.invoke(Method::Base, vec![]).await?)
    }

    /// Every asset with prices.
    pub async fn assets(&self) -> Result<Vec<Asset>, Error> {
        list(self.invoke(Method::Assets, vec![]).await?)
    }

    /// Number of decimals of the prices.
    pub async fn decimals(&self) -> Result<u32, Error> {
        self.invoke(Method::Decimals, vec![]).await?.as_u32()
    }

    /// Seconds between two price updates.
    pub async fn resolution(&self) -> Result<u32, Error> {
        self.invoke(Method::Resolution, vec![]).await?.as_u32()
    }

    /// The price of an asset at a given time.
    pub async fn price(
        &self,
        asset: &Asset,
        timestamp: u64,
    ) -> Result<Option<PriceRecord>, Error> {
        let args = vec![asset.to_wire()?, timestamp.into()];
        optional(self.invoke(Method::Price, args).await?)
    }

    /// The last `records` prices of an asset.
    pub async fn prices(
        &self,
        asset: &Asset,
        records: u32,
    ) -> Result<Option<Vec<PriceRecord>>, Error> {
        let args = vec![asset.to_wire()?, records.into()];
        optional_list(self.invoke(Method::Prices, args).await?)
    }

    /// The latest price of an asset.
    pub async fn lastprice(
        &self,
        asset: &Asset,
    ) -> Result<Option<PriceRecord>, Error> {
        let args = vec![asset.to_wire()?];
        optional(self.invoke(Method::Lastprice, args).await?)
    }
}

fn expect_unit(value: NativeValue) -> Result<(), Error> {
    match value {
        NativeValue::Null => Ok(()),
        other => Err(Error::unexpected("void", other)),
    }
}
