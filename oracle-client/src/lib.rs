// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! # Stellar Oracle Client
//!
//! The `oracle_client` library invokes a SEP-40 price oracle contract
//! deployed on Soroban and decodes its results.
//!
//! Arguments are encoded into [`WireValue`]s, sent in a signed transaction
//! through a [`Transport`], and the contract return value is decoded into a
//! [`NativeValue`] once the transaction is observed on the ledger.
//! [`OracleClient`] wraps every contract function with typed arguments and
//! results.

#![deny(missing_docs)]

mod client;
mod envelope;
mod error;
mod rpc;
mod signer;
mod submit;
mod transport;
mod xdr;

pub mod asset;
pub mod bigint;
pub mod config;
pub mod native;
pub mod wire;

pub use asset::Asset;
pub use bigint::Fixed18;
pub use client::{Method, OracleClient, PriceUpdate};
pub use config::{ConfigError, Network, OracleConfig, SecretSeed};
pub use envelope::{Envelope, Invocation, TimeBounds};
pub use error::{EncodingError, Error};
pub use native::{NativeValue, PriceRecord};
pub use rpc::RpcClient;
pub use signer::{KeypairSigner, Signer};
pub use submit::{PollPolicy, Stage, Submitter};
pub use transport::{
    AccountState, SendStatus, StatusResponse, SubmitResponse, Transport,
    TransportError, TxStatus,
};
pub use wire::{Discriminant, MapEntry, ScAddress, WireValue};
pub use xdr::MAX_DEPTH;

pub use stellar_xdr;
