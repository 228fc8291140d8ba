// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Transaction envelope carrying a single contract invocation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{self as xdr, Limits, WriteXdr};

use crate::asset::network_id;
use crate::error::{EncodingError, Error};
use crate::signer::Signer;
use crate::wire::{ScAddress, WireValue};

/// A contract function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Contract being called
    pub contract: ScAddress,
    /// Function name
    pub function: String,
    /// Positional arguments
    pub args: Vec<WireValue>,
}

impl Invocation {
    /// Build an invocation, checking the function name is a valid symbol.
    pub fn new(
        contract: ScAddress,
        function: &str,
        args: Vec<WireValue>,
    ) -> Result<Self, EncodingError> {
        WireValue::symbol(function)?;
        Ok(Self {
            contract,
            function: function.to_string(),
            args,
        })
    }

    fn operation(&self) -> Result<xdr::Operation, Error> {
        let function_name = self.function.as_str().try_into().map_err(|_| {
            EncodingError::InvalidSymbol(self.function.clone())
        })?;
        let args = self
            .args
            .iter()
            .map(xdr::ScVal::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let call = xdr::InvokeContractArgs {
            contract_address: (&self.contract).into(),
            function_name: xdr::ScSymbol(function_name),
            args: args.try_into()?,
        };
        Ok(xdr::Operation {
            source_account: None,
            body: xdr::OperationBody::InvokeHostFunction(
                xdr::InvokeHostFunctionOp {
                    host_function: xdr::HostFunction::InvokeContract(call),
                    auth: xdr::VecM::default(),
                },
            ),
        })
    }
}

/// Validity window of a transaction, in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    /// Earliest time, 0 for none
    pub min_time: u64,
    /// Latest time, 0 for none
    pub max_time: u64,
}

impl TimeBounds {
    /// Bounds that expire `timeout` from now.
    pub fn expiring_in(timeout: Duration) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            min_time: 0,
            max_time: (now + timeout).as_secs(),
        }
    }
}

impl From<TimeBounds> for xdr::Preconditions {
    fn from(bounds: TimeBounds) -> Self {
        xdr::Preconditions::Time(xdr::TimeBounds {
            min_time: xdr::TimePoint(bounds.min_time),
            max_time: xdr::TimePoint(bounds.max_time),
        })
    }
}

/// A transaction invoking a contract, from build to signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Source account public key
    pub source: [u8; 32],
    /// Sequence number consumed by this transaction
    pub sequence: i64,
    /// Total fee offered, in stroops
    pub fee: u32,
    /// Passphrase of the network the transaction is meant for
    pub network_passphrase: String,
    /// Validity window
    pub time_bounds: TimeBounds,
    /// The single operation of the transaction
    pub invocation: Invocation,
    /// Authorization entries returned by the simulation
    pub auth: Vec<xdr::SorobanAuthorizationEntry>,
    /// Resource data returned by the simulation
    pub soroban_data: Option<xdr::SorobanTransactionData>,
    /// Attached signatures
    pub signatures: Vec<xdr::DecoratedSignature>,
}

impl Envelope {
    /// Wrap an invocation into an unsigned, unprepared transaction.
    ///
    /// `sequence` is the last sequence consumed by the account: the
    /// transaction uses the next one.
    pub fn build(
        source: [u8; 32],
        sequence: i64,
        fee: u32,
        network_passphrase: impl Into<String>,
        time_bounds: TimeBounds,
        invocation: Invocation,
    ) -> Result<Self, Error> {
        let sequence = sequence.checked_add(1).ok_or_else(|| {
            Error::from(EncodingError::OutOfRange {
                value: sequence.to_string(),
                target: "sequence number",
            })
        })?;
        Ok(Self {
            source,
            sequence,
            fee,
            network_passphrase: network_passphrase.into(),
            time_bounds,
            invocation,
            auth: vec![],
            soroban_data: None,
            signatures: vec![],
        })
    }

    /// The transaction body, the part covered by signatures.
    pub fn transaction(&self) -> Result<xdr::Transaction, Error> {
        let mut operation = self.invocation.operation()?;
        if let xdr::OperationBody::InvokeHostFunction(op) = &mut operation.body
        {
            op.auth = self.auth.clone().try_into()?;
        }

        let ext = match &self.soroban_data {
            Some(data) => xdr::TransactionExt::V1(data.clone()),
            None => xdr::TransactionExt::V0,
        };

        Ok(xdr::Transaction {
            source_account: xdr::MuxedAccount::Ed25519(xdr::Uint256(
                self.source,
            )),
            fee: self.fee,
            seq_num: xdr::SequenceNumber(self.sequence),
            cond: self.time_bounds.into(),
            memo: xdr::Memo::None,
            operations: vec![operation].try_into()?,
            ext,
        })
    }

    /// Hash signed by every signer of the transaction.
    pub fn hash(&self) -> Result<[u8; 32], Error> {
        let payload = xdr::TransactionSignaturePayload {
            network_id: xdr::Hash(network_id(&self.network_passphrase)),
            tagged_transaction:
                xdr::TransactionSignaturePayloadTaggedTransaction::Tx(
                    self.transaction()?,
                ),
        };
        let bytes = payload.to_xdr(Limits::none())?;
        Ok(Sha256::digest(bytes).into())
    }

    /// Hex encoded [`Envelope::hash`], as reported by the network.
    pub fn hash_hex(&self) -> Result<String, Error> {
        self.hash().map(hex::encode)
    }

    /// Attach a signature of the transaction hash.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<(), Error> {
        let public_key = signer.public_key();
        let signature = signer.sign(&self.hash()?)?;
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public_key[28..]);
        self.signatures.push(xdr::DecoratedSignature {
            hint: xdr::SignatureHint(hint),
            signature: xdr::Signature(signature.to_vec().try_into()?),
        });
        Ok(())
    }

    /// XDR of the full envelope, signatures included.
    pub fn to_xdr(&self) -> Result<Vec<u8>, Error> {
        let envelope =
            xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
                tx: self.transaction()?,
                signatures: self.signatures.clone().try_into()?,
            });
        Ok(envelope.to_xdr(Limits::none())?)
    }

    /// Base64 of [`Envelope::to_xdr`], as sent to the network.
    pub fn to_xdr_base64(&self) -> Result<String, Error> {
        self.to_xdr().map(|bytes| BASE64.encode(bytes))
    }
}
