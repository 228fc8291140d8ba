// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! The boundary between the submission logic and the network.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stellar_xdr::curr::{self as xdr, ReadXdr};

use crate::envelope::Envelope;
use crate::error::Error;
use crate::wire::WireValue;
use crate::xdr::{decode_base64, read_limits};

/// Errors raised by a [`Transport`]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Request could not be performed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Payload could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The server answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message
        message: String,
    },
    /// The response is missing fields or carries invalid XDR
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The transaction could not be encoded for sending
    #[error("Cannot encode transaction: {0}")]
    Encoding(String),
    /// The source account does not exist on the ledger
    #[error("Account {0} not found")]
    AccountNotFound(String),
    /// The simulation of the transaction failed
    #[error("Simulation failed: {message}")]
    Simulation {
        /// Error reported by the simulation
        message: String,
        /// Raw simulation response
        raw: Value,
    },
    /// The network did not accept the transaction
    #[error("Transaction rejected with status {status}")]
    Rejected {
        /// Reported status
        status: SendStatus,
        /// Raw submission response
        raw: Value,
    },
}

/// Sequence state of a source account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    /// Account public key
    pub public_key: [u8; 32],
    /// Last sequence number consumed by the account
    pub sequence: i64,
}

/// Status returned when sending a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    /// Accepted, awaiting inclusion
    Pending,
    /// Already known to the server
    Duplicate,
    /// Server is congested
    TryAgainLater,
    /// Rejected
    Error,
    /// Any status this client does not know
    #[serde(other)]
    Unknown,
}

impl SendStatus {
    /// Whether the transaction will be considered for inclusion
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Pending | Self::Duplicate)
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let status = match self {
            Self::Pending => "PENDING",
            Self::Duplicate => "DUPLICATE",
            Self::TryAgainLater => "TRY_AGAIN_LATER",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(status)
    }
}

/// Outcome of sending a transaction
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    /// Transaction hash, hex encoded
    pub hash: String,
    /// Send status
    pub status: SendStatus,
    /// Raw response
    pub raw: Value,
}

/// Status of a transaction known by hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    /// Not yet observed
    NotFound,
    /// Applied successfully
    Success,
    /// Applied and failed
    Failed,
    /// Any status this client does not know
    #[serde(other)]
    Unknown,
}

impl TxStatus {
    /// Whether the status ends the wait
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let status = match self {
            Self::NotFound => "NOT_FOUND",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(status)
    }
}

/// Response to a transaction status query
#[derive(Debug, Clone)]
pub struct StatusResponse {
    /// Transaction hash, hex encoded
    pub hash: String,
    /// Reported status
    pub status: TxStatus,
    /// Base64 XDR of the `TransactionMeta` of an applied transaction
    pub result_meta: Option<String>,
    /// Raw response
    pub raw: Value,
}

impl StatusResponse {
    /// Decode the contract return value carried by the transaction meta.
    ///
    /// Transactions that do not invoke a contract have no return value.
    pub fn return_value(&self) -> Result<Option<WireValue>, Error> {
        let Some(meta) = self.result_meta.as_deref() else {
            return Ok(None);
        };
        let bytes = decode_base64(meta)?;
        let meta = xdr::TransactionMeta::from_xdr(
            &bytes,
            read_limits(bytes.len()),
        )?;

        // TODO: read `TransactionMeta::V4` once stellar-xdr 23 is in use
        match meta {
            xdr::TransactionMeta::V3(xdr::TransactionMetaV3 {
                soroban_meta: Some(soroban),
                ..
            }) => WireValue::try_from(&soroban.return_value).map(Some),
            _ => Ok(None),
        }
    }
}

/// Network operations needed to submit an invocation and observe it
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the current sequence state of an account.
    async fn fetch_account(
        &self,
        public_key: &[u8; 32],
    ) -> Result<AccountState, TransportError>;

    /// Simulate the envelope and fill in its resources, authorizations and
    /// fee.
    async fn prepare(
        &self,
        envelope: Envelope,
    ) -> Result<Envelope, TransportError>;

    /// Send a signed envelope.
    async fn submit(
        &self,
        envelope: &Envelope,
    ) -> Result<SubmitResponse, TransportError>;

    /// Query the status of a transaction by hash.
    async fn transaction_status(
        &self,
        hash: &str,
    ) -> Result<StatusResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch_account(
        &self,
        public_key: &[u8; 32],
    ) -> Result<AccountState, TransportError> {
        (**self).fetch_account(public_key).await
    }

    async fn prepare(
        &self,
        envelope: Envelope,
    ) -> Result<Envelope, TransportError> {
        (**self).prepare(envelope).await
    }

    async fn submit(
        &self,
        envelope: &Envelope,
    ) -> Result<SubmitResponse, TransportError> {
        (**self).submit(envelope).await
    }

    async fn transaction_status(
        &self,
        hash: &str,
    ) -> Result<StatusResponse, TransportError> {
        (**self).transaction_status(hash).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::wire::Discriminant;

    #[test]
    fn statuses() {
        let status: SendStatus =
            serde_json::from_str("\"TRY_AGAIN_LATER\"").unwrap();
        assert_eq!(status, SendStatus::TryAgainLater);
        assert!(!status.is_accepted());
        let status: SendStatus = serde_json::from_str("\"NEW\"").unwrap();
        assert_eq!(status, SendStatus::Unknown);
        assert!(SendStatus::Duplicate.is_accepted());

        let status: TxStatus = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert!(!status.is_terminal());
        assert_eq!(status.to_string(), "NOT_FOUND");
        let status: TxStatus = serde_json::from_str("\"FAILED\"").unwrap();
        assert!(status.is_terminal());
    }

    pub(crate) fn meta_with(value: Option<xdr::ScVal>) -> String {
        use stellar_xdr::curr::{Limits, WriteXdr};

        let soroban_meta = value.map(|return_value| {
            xdr::SorobanTransactionMeta {
                ext: xdr::SorobanTransactionMetaExt::V0,
                events: xdr::VecM::default(),
                return_value,
                diagnostic_events: xdr::VecM::default(),
            }
        });
        xdr::TransactionMeta::V3(xdr::TransactionMetaV3 {
            ext: xdr::ExtensionPoint::V0,
            tx_changes_before: xdr::LedgerEntryChanges::default(),
            operations: xdr::VecM::default(),
            tx_changes_after: xdr::LedgerEntryChanges::default(),
            soroban_meta,
        })
        .to_xdr_base64(Limits::none())
        .unwrap()
    }

    #[test]
    fn return_value() {
        let mut response = StatusResponse {
            hash: "00".into(),
            status: TxStatus::Success,
            result_meta: None,
            raw: Value::Null,
        };
        assert_eq!(response.return_value().unwrap(), None);

        response.result_meta = Some(meta_with(Some(xdr::ScVal::U32(6))));
        assert_eq!(response.return_value().unwrap(), Some(WireValue::U32(6)));

        response.result_meta = Some(meta_with(None));
        assert_eq!(response.return_value().unwrap(), None);

        let string = xdr::ScVal::String(xdr::ScString("6".try_into().unwrap()));
        response.result_meta = Some(meta_with(Some(string)));
        assert_matches!(
            response.return_value(),
            Err(Error::UnsupportedVariant(Discriminant::String))
        );

        // a bare ScVal is not a transaction meta
        response.result_meta = Some("AAAAAwAAAAY=".into());
        assert_matches!(response.return_value(), Err(Error::Malformed(_)));
    }
}
