// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.


use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use oracle_client::bigint::i128_to_wire;
use oracle_client::{
    Asset, Error, Fixed18, Invocation, KeypairSigner, MapEntry, Method,
    NativeValue, Network, OracleClient, OracleConfig, PollPolicy,
    PriceRecord, PriceUpdate, ScAddress, SecretSeed, SendStatus, Signer,
    Submitter, TransportError, TxStatus, WireValue,
};
use tokio_util::sync::CancellationToken;

use mock::{MockTransport, CONTRACT, RESOURCE_FEE, SEED, SEQUENCE};

const FAST: PollPolicy = PollPolicy::fixed(Duration::from_millis(1), 5);

fn config(poll: PollPolicy) -> OracleConfig {
    OracleConfig::new(Network::Testnet, CONTRACT)
        .with_signing_key(SecretSeed::new(SEED))
        .with_poll(poll)
}

fn client(
    transport: &Arc<MockTransport>,
) -> OracleClient<Arc<MockTransport>> {
    OracleClient::with_transport(&config(FAST), transport.clone())
        .expect("client should be built")
}

fn price_map(price: i128, timestamp: u64) -> WireValue {
    WireValue::Map(vec![
        MapEntry {
            key: WireValue::symbol("price").unwrap(),
            val: i128_to_wire(price),
        },
        MapEntry {
            key: WireValue::symbol("timestamp").unwrap(),
            val: WireValue::U64(timestamp),
        },
    ])
}

fn submitter(
    transport: &Arc<MockTransport>,
    poll: PollPolicy,
) -> Submitter<Arc<MockTransport>> {
    let config = config(poll);
    Submitter::new(
        transport.clone(),
        config.network_passphrase().unwrap(),
        config.base_fee,
        config.tx_timeout,
        poll,
    )
}

fn invocation() -> Invocation {
    let contract = ScAddress::from_strkey(CONTRACT).unwrap();
    Invocation::new(contract, "decimals", vec![]).unwrap()
}

#[tokio::test]
async fn polls_until_success() {
    let transport = Arc::new(
        MockTransport::new()
            .then(TxStatus::NotFound, None)
            .then(TxStatus::NotFound, None)
            .returning(WireValue::U32(14)),
    );
    let signer = KeypairSigner::from_secret(SEED).unwrap();

    let value = submitter(&transport, FAST)
        .submit(invocation(), &signer, &CancellationToken::new())
        .await
        .expect("submission should succeed");

    assert_eq!(value, NativeValue::UInt(14));
    assert_eq!(transport.status_queries(), 3);

    let submitted = transport.submitted();
    assert_eq!(submitted.len(), 1, "envelope is sent exactly once");
    let envelope = &submitted[0];
    assert_eq!(envelope.source, signer.public_key());
    assert_eq!(envelope.sequence, SEQUENCE + 1);
    assert_eq!(envelope.fee, config(FAST).base_fee + RESOURCE_FEE);
    assert_eq!(envelope.signatures.len(), 1);
    assert_eq!(envelope.invocation.function, "decimals");
}

#[tokio::test]
async fn success_without_return_value() {
    let transport =
        Arc::new(MockTransport::new().then(TxStatus::Success, None));
    let signer = KeypairSigner::from_secret(SEED).unwrap();

    let value = submitter(&transport, FAST)
        .submit(invocation(), &signer, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(value, NativeValue::Null);
}

#[tokio::test]
async fn failed_transaction_carries_response() {
    let transport =
        Arc::new(MockTransport::new().then(TxStatus::Failed, None));
    let signer = KeypairSigner::from_secret(SEED).unwrap();

    let result = submitter(&transport, FAST)
        .submit(invocation(), &signer, &CancellationToken::new())
        .await;

    let response = assert_matches!(
        result,
        Err(Error::TransactionFailed(response)) => response
    );
    assert_eq!(response.status, TxStatus::Failed);
    assert_eq!(response.raw["status"], "FAILED");
    assert_eq!(transport.status_queries(), 1);
}

#[tokio::test]
async fn unknown_status_is_terminal() {
    let transport =
        Arc::new(MockTransport::new().then(TxStatus::Unknown, None));
    let signer = KeypairSigner::from_secret(SEED).unwrap();

    let result = submitter(&transport, FAST)
        .submit(invocation(), &signer, &CancellationToken::new())
        .await;
    assert_matches!(result, Err(Error::TransactionFailed(_)));
    assert_eq!(transport.status_queries(), 1);
}

#[tokio::test]
async fn preparation_failure() {
    let transport =
        Arc::new(MockTransport::new().failing_prepare("HostError"));
    let signer = KeypairSigner::from_secret(SEED).unwrap();

    let result = submitter(&transport, FAST)
        .submit(invocation(), &signer, &CancellationToken::new())
        .await;

    assert_matches!(
        result,
        Err(Error::PreparationFailed(TransportError::Simulation {
            message,
            ..
        })) if message == "HostError"
    );
    assert!(transport.submitted().is_empty());
    assert_eq!(transport.status_queries(), 0);
}

#[tokio::test]
async fn rejected_submission() {
    for status in [SendStatus::TryAgainLater, SendStatus::Error] {
        let transport =
            Arc::new(MockTransport::new().send_status(status.clone()));
        let signer = KeypairSigner::from_secret(SEED).unwrap();

        let result = submitter(&transport, FAST)
            .submit(invocation(), &signer, &CancellationToken::new())
            .await;

        assert_matches!(
            result,
            Err(Error::SubmissionRejected(TransportError::Rejected {
                status: rejected,
                ..
            })) if rejected == status
        );
        assert_eq!(transport.status_queries(), 0);
    }
}

#[tokio::test]
async fn duplicate_submission_is_awaited() {
    let transport = Arc::new(
        MockTransport::new()
            .send_status(SendStatus::Duplicate)
            .returning(WireValue::Bool(true)),
    );
    let signer = KeypairSigner::from_secret(SEED).unwrap();

    let value = submitter(&transport, FAST)
        .submit(invocation(), &signer, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(value, NativeValue::Bool(true));
}

#[tokio::test]
async fn times_out_after_max_attempts() {
    let transport = Arc::new(MockTransport::new());
    let signer = KeypairSigner::from_secret(SEED).unwrap();
    let poll = PollPolicy::fixed(Duration::from_millis(1), 3);

    let result = submitter(&transport, poll)
        .submit(invocation(), &signer, &CancellationToken::new())
        .await;

    let hash = transport.submitted()[0].hash_hex().unwrap();
    assert_matches!(
        result,
        Err(Error::TimedOut { hash: h, attempts: 3 }) if h == hash
    );
    assert_eq!(transport.status_queries(), 3);
}

#[tokio::test]
async fn transient_query_errors_are_retried() {
    let transport = Arc::new(
        MockTransport::new()
            .then_error("connection reset")
            .then(TxStatus::NotFound, None)
            .returning(WireValue::U64(7)),
    );
    let signer = KeypairSigner::from_secret(SEED).unwrap();

    let value = submitter(&transport, FAST)
        .submit(invocation(), &signer, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(value, NativeValue::UInt(7));
    assert_eq!(transport.status_queries(), 3);
}

#[tokio::test]
async fn cancelled_before_submission() {
    let transport = Arc::new(MockTransport::new());
    let signer = KeypairSigner::from_secret(SEED).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = submitter(&transport, FAST)
        .submit(invocation(), &signer, &cancel)
        .await;

    let hash = transport.prepared()[0].hash_hex().unwrap();
    assert_matches!(result, Err(Error::Cancelled { hash: h }) if h == hash);
    assert!(transport.submitted().is_empty());
    assert_eq!(transport.status_queries(), 0);
}

#[tokio::test]
async fn cancelled_while_waiting() {
    let transport = Arc::new(MockTransport::new());
    let client = OracleClient::with_transport(
        &config(PollPolicy::fixed(Duration::from_secs(60), 10)),
        transport.clone(),
    )
    .unwrap();

    let cancel = client.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let result =
        tokio::time::timeout(Duration::from_secs(5), client.decimals())
            .await
            .expect("cancellation should end the wait");

    assert_matches!(result, Err(Error::Cancelled { .. }));
    assert_eq!(transport.submitted().len(), 1);
    assert_eq!(transport.status_queries(), 1);
}

#[tokio::test]
async fn wait_for_known_hash() {
    let transport =
        Arc::new(MockTransport::new().returning(WireValue::U32(300)));
    let client = client(&transport);

    let value = client.wait_for(&"ab".repeat(32)).await.unwrap();
    assert_eq!(value, NativeValue::UInt(300));
    assert!(transport.submitted().is_empty());
}

#[tokio::test]
async fn lastprice() {
    let transport = Arc::new(
        MockTransport::new()
            .returning(price_map(1_500_000_000_000_000_000, 1000))
            .returning(WireValue::Void),
    );
    let client = client(&transport);
    let asset = client.asset("XLM", None).unwrap();

    let record = client.lastprice(&asset).await.unwrap();
    assert_eq!(
        record,
        Some(PriceRecord {
            price: "1.5".into(),
            timestamp: 1000,
        })
    );
    assert_eq!(client.lastprice(&asset).await.unwrap(), None);

    let submitted = transport.submitted();
    assert_eq!(submitted[0].invocation.function, "lastprice");
    assert_eq!(submitted[0].invocation.args, [asset.to_wire().unwrap()]);
}

#[tokio::test]
async fn price_calls_price() {
    let transport =
        Arc::new(MockTransport::new().returning(price_map(2, 1200)));
    let client = client(&transport);
    let asset = Asset::Other("BTC".into());

    let record = client.price(&asset, 1200).await.unwrap().unwrap();
    assert_eq!(record.timestamp, 1200);

    let invocation = &transport.submitted()[0].invocation;
    assert_eq!(invocation.function, "price");
    assert_eq!(invocation.args, [
        asset.to_wire().unwrap(),
        WireValue::U64(1200)
    ]);
}

#[tokio::test]
async fn prices_by_source() {
    let transport = Arc::new(
        MockTransport::new()
            .returning(WireValue::Vec(vec![
                price_map(3, 600),
                price_map(2, 300),
            ]))
            .returning(WireValue::Void),
    );
    let client = client(&transport);
    let asset = Asset::Other("EUR".into());

    let records = client
        .prices_by_source(1, &asset, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].timestamp, 600);

    assert_eq!(client.prices_by_source(1, &asset, 2).await.unwrap(), None);
}

#[tokio::test]
async fn contract_settings() {
    let base = Asset::Other("USD".into());
    let transport = Arc::new(
        MockTransport::new()
            .returning(base.to_wire().unwrap())
            .returning(WireValue::U32(14))
            .returning(WireValue::U32(300))
            .returning(WireValue::Vec(vec![
                WireValue::U32(0),
                WireValue::U32(1),
            ]))
            .returning(WireValue::Bool(true)),
    );
    let client = client(&transport);

    assert_eq!(client.base().await.unwrap(), base);
    assert_eq!(client.decimals().await.unwrap(), 14);
    assert_eq!(client.resolution().await.unwrap(), 300);
    assert_eq!(client.sources().await.unwrap(), [0, 1]);
    assert!(client.has_admin().await.unwrap());
}

#[tokio::test]
async fn add_price_arguments() {
    let transport =
        Arc::new(MockTransport::new().then(TxStatus::Success, None));
    let client = client(&transport);
    let asset = Asset::Other("BTC".into());
    let price: Fixed18 = "42000.5".parse().unwrap();

    client.add_price(0, &asset, price, 1700).await.unwrap();

    let invocation = &transport.submitted()[0].invocation;
    assert_eq!(invocation.function, Method::AddPrice.as_str());
    assert_eq!(invocation.args, [
        WireValue::U32(0),
        asset.to_wire().unwrap(),
        i128_to_wire(42_000_500_000_000_000_000_000),
        WireValue::U64(1700),
    ]);
}

#[tokio::test]
async fn add_prices_sends_one_vector_of_structs() {
    let transport =
        Arc::new(MockTransport::new().then(TxStatus::Success, None));
    let client = client(&transport);
    let btc = PriceUpdate {
        source: 0,
        asset: Asset::Other("BTC".into()),
        price: "42000.5".parse().unwrap(),
        timestamp: 1700,
    };
    let xlm = PriceUpdate {
        source: 1,
        asset: client.asset("XLM", Some("native")).unwrap(),
        price: "0.12".parse().unwrap(),
        timestamp: 1760,
    };

    client.add_prices(&[btc.clone(), xlm.clone()]).await.unwrap();

    let submitted = transport.submitted();
    assert_eq!(submitted.len(), 1);
    let invocation = &submitted[0].invocation;
    assert_eq!(invocation.function, "add_prices");
    assert_eq!(invocation.args, [WireValue::Vec(vec![
        btc.to_wire().unwrap(),
        xlm.to_wire().unwrap(),
    ])]);

    let WireValue::Map(entries) = btc.to_wire().unwrap() else {
        panic!("a price is a map");
    };
    assert_eq!(entries[0].key, WireValue::symbol("asset").unwrap());
    assert_eq!(entries[1].val, i128_to_wire(42_000_500_000_000_000_000_000));
    assert_eq!(entries[2].val, WireValue::U32(0));
    assert_eq!(entries[3].val, WireValue::U64(1700));

    // the envelope carries the whole batch
    assert!(submitted[0].to_xdr_base64().is_ok());
}

#[tokio::test]
async fn unexpected_result_shape() {
    let transport =
        Arc::new(MockTransport::new().returning(WireValue::U32(1)));
    let client = client(&transport);

    assert_matches!(
        client.base().await,
        Err(Error::UnexpectedValue { expected: "asset", .. })
    );
}

#[tokio::test]
async fn missing_signer() {
    let transport = Arc::new(MockTransport::new());
    let config = OracleConfig::new(Network::Testnet, CONTRACT)
        .with_poll(FAST);
    let client =
        OracleClient::with_transport(&config, transport.clone()).unwrap();

    assert_matches!(client.decimals().await, Err(Error::MissingSigner));
    assert!(transport.submitted().is_empty());
}

#[tokio::test]
async fn explicit_signer() {
    let transport =
        Arc::new(MockTransport::new().returning(WireValue::U32(7)));
    let signer = KeypairSigner::from_seed_bytes([7; 32]);
    let client = client(&transport).with_signer(signer.clone());

    client.decimals().await.unwrap();
    assert_eq!(transport.submitted()[0].source, signer.public_key());
}

#[tokio::test]
async fn remove_prices_is_not_implemented() {
    let transport = Arc::new(MockTransport::new());
    let client = client(&transport);

    assert_matches!(
        client.remove_prices(&[0], &[], 0, 100).await,
        Err(Error::NotImplemented("remove_prices"))
    );
    assert_matches!(
        client.invoke(Method::RemovePrices, vec![]).await,
        Err(Error::NotImplemented(_))
    );
    assert!(transport.submitted().is_empty());
}
