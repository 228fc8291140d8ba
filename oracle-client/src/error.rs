// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use crate::config::ConfigError;
use crate::transport::{StatusResponse, TransportError};
use crate::wire::Discriminant;

/// Errors returned by this library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument could not be turned into a wire value
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
    /// The wire value carries a discriminant this client does not decode
    #[error("Unsupported wire variant: {0}")]
    UnsupportedVariant(Discriminant),
    /// Wire bytes are truncated or ill-formed
    #[error("Malformed wire value: {0}")]
    Malformed(String),
    /// A decoded value does not have the shape the operation returns
    #[error("Unexpected value: expected {expected}, found {found}")]
    UnexpectedValue {
        /// What the operation expected
        expected: &'static str,
        /// Debug rendering of what was decoded
        found: String,
    },
    /// Transport errors outside of preparation and submission
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    /// The transaction could not be simulated/prepared
    #[error("Transaction preparation failed: {0}")]
    PreparationFailed(TransportError),
    /// The network refused the signed transaction
    #[error("Transaction submission rejected: {0}")]
    SubmissionRejected(TransportError),
    /// The transaction reached a terminal status other than success
    #[error("Transaction {} failed with status {}", .0.hash, .0.status)]
    TransactionFailed(Box<StatusResponse>),
    /// The transaction was not observed within the poll policy
    #[error("Transaction {hash} not observed after {attempts} attempts")]
    TimedOut {
        /// Submission hash
        hash: String,
        /// Status queries performed
        attempts: u32,
    },
    /// Waiting for the transaction was cancelled by the caller
    #[error("Waiting for transaction {hash} was cancelled")]
    Cancelled {
        /// Submission hash
        hash: String,
    },
    /// Signing errors
    #[error("Signing error: {0}")]
    Signing(String),
    /// No signer was configured nor supplied for the call
    #[error("No signing key available for this call")]
    MissingSigner,
    /// The operation is stubbed
    #[error("{0} is not implemented yet")]
    NotImplemented(&'static str),
    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while encoding native arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// Integer does not fit in the target wire type
    #[error("{value} does not fit in {target}")]
    OutOfRange {
        /// The offending value
        value: String,
        /// The wire type it was meant for
        target: &'static str,
    },
    /// Not a decimal number
    #[error("Invalid decimal: {0:?}")]
    InvalidDecimal(String),
    /// Not a valid account or contract strkey
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),
    /// Not a valid contract symbol
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),
    /// Asset code length outside of 1..=12
    #[error("Invalid asset code: {0:?}")]
    InvalidAssetCode(String),
    /// The value cannot be written as XDR
    #[error("XDR encoding failed: {0}")]
    Xdr(String),
}

impl Error {
    pub(crate) fn unexpected(
        expected: &'static str,
        found: impl std::fmt::Debug,
    ) -> Self {
        Self::UnexpectedValue {
            expected,
            found: format!("{found:?}"),
        }
    }
}
