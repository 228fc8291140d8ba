// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! [`Transport`] over the Soroban JSON-RPC API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stellar_strkey::ed25519;
use stellar_xdr::curr::{self as xdr, Limits, ReadXdr, WriteXdr};
use tracing::trace;
use url::Url;

use crate::envelope::Envelope;
use crate::transport::{
    AccountState, SendStatus, StatusResponse, SubmitResponse, Transport,
    TransportError, TxStatus,
};
use crate::xdr::{account_id, read_limits};

#[derive(Serialize)]
struct Request<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct Response {
    result: Option<Value>,
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct LedgerEntries {
    #[serde(default)]
    entries: Option<Vec<LedgerEntry>>,
}

#[derive(Deserialize)]
struct LedgerEntry {
    xdr: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Simulation {
    error: Option<String>,
    transaction_data: Option<String>,
    min_resource_fee: Option<String>,
    #[serde(default)]
    results: Vec<SimulationResult>,
    restore_preamble: Option<Value>,
}

#[derive(Deserialize)]
struct SimulationResult {
    #[serde(default)]
    auth: Vec<String>,
}

#[derive(Deserialize)]
struct SendResult {
    hash: String,
    status: SendStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionResult {
    status: TxStatus,
    result_meta_xdr: Option<String>,
}

#[derive(Deserialize)]
struct Health {
    status: String,
}

#[derive(Clone)]
/// Soroban JSON-RPC client
pub struct RpcClient {
    client: reqwest::Client,
    url: Url,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Create a new RPC client
    ///
    /// # Errors
    /// This method errors if a TLS backend cannot be initialized, or the
    /// resolver cannot load the system configuration.
    pub fn new(url: Url) -> Result<Self, TransportError> {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            url,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// The endpoint of this client
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Perform a JSON-RPC call and return the raw `result` member.
    ///
    /// # Errors
    /// This method errors if the request cannot be sent, if the server
    /// answers with a non-success HTTP status or with an error object.
    pub async fn call<P: Serialize>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(id, method, "rpc request");

        let request = Request {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let response =
            self.client.post(self.url.clone()).json(&request).send().await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::InvalidResponse(format!(
                "{status}: {body}"
            )));
        }

        let response: Response = response.json().await?;
        if let Some(error) = response.error {
            return Err(TransportError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response.result.ok_or_else(|| {
            TransportError::InvalidResponse(format!(
                "{method} response without result"
            ))
        })
    }

    async fn call_typed<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<(R, Value), TransportError> {
        let raw = self.call(method, params).await?;
        let typed = serde_json::from_value(raw.clone())?;
        Ok((typed, raw))
    }

    /// Health status reported by the server
    pub async fn health(&self) -> Result<String, TransportError> {
        let (health, _): (Health, _) =
            self.call_typed("getHealth", json!({})).await?;
        Ok(health.status)
    }
}

fn invalid(what: &str) -> impl Fn(xdr::Error) -> TransportError + '_ {
    move |e| TransportError::InvalidResponse(format!("{what}: {e}"))
}

/// Read a base64 XDR item of a response.
fn read_item<T: ReadXdr>(s: &str, what: &str) -> Result<T, TransportError> {
    let bytes = BASE64
        .decode(s)
        .map_err(|e| TransportError::InvalidResponse(format!("{what}: {e}")))?;
    T::from_xdr(&bytes, read_limits(bytes.len())).map_err(invalid(what))
}

fn envelope_xdr(envelope: &Envelope) -> Result<String, TransportError> {
    envelope
        .to_xdr_base64()
        .map_err(|e| TransportError::Encoding(e.to_string()))
}

fn account_key(public_key: &[u8; 32]) -> Result<String, TransportError> {
    let key = xdr::LedgerKey::Account(xdr::LedgerKeyAccount {
        account_id: account_id(public_key),
    });
    let bytes = key
        .to_xdr(Limits::none())
        .map_err(|e| TransportError::Encoding(e.to_string()))?;
    Ok(BASE64.encode(bytes))
}

/// Read the sequence number of an account ledger entry.
fn account_sequence(entry: &str) -> Result<i64, TransportError> {
    match read_item(entry, "account entry")? {
        xdr::LedgerEntryData::Account(account) => Ok(account.seq_num.0),
        _ => Err(TransportError::InvalidResponse(
            "ledger entry is not an account".into(),
        )),
    }
}

#[async_trait]
impl Transport for RpcClient {
    async fn fetch_account(
        &self,
        public_key: &[u8; 32],
    ) -> Result<AccountState, TransportError> {
        let params = json!({ "keys": [account_key(public_key)?] });
        let (entries, _): (LedgerEntries, _) =
            self.call_typed("getLedgerEntries", params).await?;

        let entry = entries
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| {
                let account = ed25519::PublicKey(*public_key).to_string();
                TransportError::AccountNotFound(account)
            })?;
        let sequence = account_sequence(&entry.xdr)?;

        Ok(AccountState {
            public_key: *public_key,
            sequence,
        })
    }

    async fn prepare(
        &self,
        mut envelope: Envelope,
    ) -> Result<Envelope, TransportError> {
        let params = json!({ "transaction": envelope_xdr(&envelope)? });
        let (simulation, raw): (Simulation, _) =
            self.call_typed("simulateTransaction", params).await?;

        if let Some(message) = simulation.error {
            return Err(TransportError::Simulation { message, raw });
        }
        if simulation.restore_preamble.is_some() {
            return Err(TransportError::Simulation {
                message: "archived ledger entries must be restored first"
                    .into(),
                raw,
            });
        }

        let data = simulation.transaction_data.ok_or_else(|| {
            TransportError::InvalidResponse(
                "simulation without transaction data".into(),
            )
        })?;
        let resource_fee = simulation
            .min_resource_fee
            .as_deref()
            .unwrap_or("0")
            .parse::<u32>()
            .map_err(|e| {
                TransportError::InvalidResponse(format!("minResourceFee: {e}"))
            })?;

        envelope.soroban_data = Some(read_item(&data, "transactionData")?);
        envelope.fee =
            envelope.fee.checked_add(resource_fee).ok_or_else(|| {
                TransportError::InvalidResponse(format!(
                    "fee overflow with resource fee {resource_fee}"
                ))
            })?;
        if envelope.auth.is_empty() {
            if let Some(result) = simulation.results.first() {
                envelope.auth = result
                    .auth
                    .iter()
                    .map(|entry| read_item(entry, "auth entry"))
                    .collect::<Result<_, _>>()?;
            }
        }

        Ok(envelope)
    }

    async fn submit(
        &self,
        envelope: &Envelope,
    ) -> Result<SubmitResponse, TransportError> {
        let params = json!({ "transaction": envelope_xdr(&envelope)? });
        let (sent, raw): (SendResult, _) =
            self.call_typed("sendTransaction", params).await?;

        Ok(SubmitResponse {
            hash: sent.hash,
            status: sent.status,
            raw,
        })
    }

    async fn transaction_status(
        &self,
        hash: &str,
    ) -> Result<StatusResponse, TransportError> {
        let params = json!({ "hash": hash });
        let (tx, raw): (TransactionResult, _) =
            self.call_typed("getTransaction", params).await?;

        Ok(StatusResponse {
            hash: hash.to_string(),
            status: tx.status,
            result_meta: tx.result_meta_xdr,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::native::{decode, NativeValue};
    use crate::transport::tests::meta_with;

    #[test]
    fn ledger_key() {
        let key = BASE64.decode(account_key(&[5; 32]).unwrap()).unwrap();
        assert_eq!(&key[..8], &[0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&key[8..], &[5; 32]);
    }

    #[test]
    fn sequence_from_entry() {
        let entry = xdr::LedgerEntryData::Account(xdr::AccountEntry {
            account_id: account_id(&[5; 32]),
            balance: 10_000_000,
            seq_num: xdr::SequenceNumber(123_456),
            num_sub_entries: 0,
            inflation_dest: None,
            flags: 0,
            home_domain: xdr::String32::default(),
            thresholds: xdr::Thresholds([1, 0, 0, 0]),
            signers: xdr::VecM::default(),
            ext: xdr::AccountEntryExt::V0,
        });
        let entry = BASE64.encode(entry.to_xdr(Limits::none()).unwrap());
        assert_eq!(account_sequence(&entry).unwrap(), 123_456);

        // a contract data entry
        let other = BASE64.encode([0, 0, 0, 6, 0, 0, 0, 0]);
        assert_matches!(
            account_sequence(&other),
            Err(TransportError::InvalidResponse(_))
        );
        assert_matches!(
            account_sequence("AAAAAA=="),
            Err(TransportError::InvalidResponse(_))
        );
    }

    #[test]
    fn response_shapes() {
        let simulation: Simulation = serde_json::from_value(json!({
            "transactionData": "AAAA",
            "minResourceFee": "58181",
            "results": [{ "auth": [], "xdr": "AAAAAQ==" }],
            "latestLedger": 1000
        }))
        .unwrap();
        assert_eq!(simulation.min_resource_fee.as_deref(), Some("58181"));
        assert!(simulation.error.is_none());

        let sent: SendResult = serde_json::from_value(json!({
            "hash": "ab",
            "status": "DUPLICATE"
        }))
        .unwrap();
        assert!(sent.status.is_accepted());
    }

    #[test]
    fn return_value_from_transaction_meta() {
        let meta = meta_with(Some(xdr::ScVal::U32(14)));
        let raw = json!({
            "status": "SUCCESS",
            "latestLedger": 1_254_322,
            "latestLedgerCloseTime": "1727883512",
            "oldestLedger": 1_133_363,
            "oldestLedgerCloseTime": "1727278562",
            "applicationOrder": 1,
            "feeBump": false,
            "envelopeXdr": "AAAAAgAAAAA=",
            "resultXdr": "AAAAAAABNCwAAAAAAAAAAQAAAAAAAAAYAAAAAA==",
            "resultMetaXdr": meta,
            "ledger": 1_254_320,
            "createdAt": "1727883502"
        });

        let tx: TransactionResult =
            serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(tx.status, TxStatus::Success);
        let response = StatusResponse {
            hash: "ab".into(),
            status: tx.status,
            result_meta: tx.result_meta_xdr,
            raw,
        };

        let value = response.return_value().unwrap().unwrap();
        assert_eq!(decode(&value).unwrap(), NativeValue::UInt(14));
    }

    #[test]
    fn pending_transaction_has_no_meta() {
        let tx: TransactionResult = serde_json::from_value(json!({
            "status": "NOT_FOUND",
            "latestLedger": 1_254_322,
            "oldestLedger": 1_133_363
        }))
        .unwrap();
        assert_eq!(tx.status, TxStatus::NotFound);
        assert!(tx.result_meta_xdr.is_none());
    }
}
