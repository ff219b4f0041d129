//! Integration tests for the explorer API endpoints
//!
//! These drive the full router against an in-memory store and node and check
//! status codes, JSON shapes and paging defaults.

use axum_test::TestServer;
use blockex::api::build_api_router;
use blockex::explorer::Explorer;
use blockex::model::{Block, CoinSnapshot, Masternode, Peer, Transaction};
use blockex::rpc::{DecodedTransaction, FailureMode, MemoryNodeClient};
use blockex::store::{MemoryStore, Store, StoreExt};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap()
}

fn tx(hash: &str, height: u64, addrs: &[&str]) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        height,
        block_hash: format!("block{}", height),
        addrs: addrs.iter().map(|a| a.to_string()).collect(),
        recipients: 1,
        value: 2.5,
        created_at: at(height as i64),
    }
}

fn block(hash: &str, height: u64, txs: &[&str]) -> Block {
    Block {
        hash: hash.to_string(),
        height,
        prev: None,
        merkle_root: "00".to_string(),
        bits: "1d00ffff".to_string(),
        nonce: 7,
        size: 300,
        ver: 1,
        created_at: at(height as i64),
        txs: txs.iter().map(|t| t.to_string()).collect(),
    }
}

fn peer(ip: &str, secs: i64) -> Peer {
    Peer {
        ip: ip.to_string(),
        port: 52543,
        country: "NL".to_string(),
        sub_version: "/Core:2.0/".to_string(),
        ver: 70015,
        created_at: at(secs),
    }
}

/// Seed a small chain: 12 transactions over heights 1..=12, block 5 with
/// three listed transactions, block 6 with none.
fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    for height in 1..=12u64 {
        let addrs: &[&str] = if height % 2 == 0 { &["alice"] } else { &["bob"] };
        store.insert_record(&tx(&format!("t{}", height), height, addrs)).unwrap();
    }
    store.insert_record(&block("b5", 5, &["t5", "t4", "missing"])).unwrap();
    store.insert_record(&block("b6", 6, &[])).unwrap();
    for i in 0..3 {
        store
            .insert_record(&CoinSnapshot {
                created_at: at(i),
                blocks: 100 + i as u64,
                btc: 0.0001,
                usd: 0.4,
                cap: 1000.0,
                diff: 2.0,
                mn_on: 5,
                mn_off: 0,
                net_hash: 3.0,
                peers: 4,
                status: "Online".to_string(),
                supply: 1000.0 + i as f64,
            })
            .unwrap();
    }
    for height in 0..13u64 {
        store
            .insert_record(&Masternode {
                rank: height as u32,
                status: "ENABLED".to_string(),
                addr: format!("mn{}", height),
                txhash: format!("c{}", height),
                outidx: 1,
                active: 0,
                lastseen: 0,
                lastpaid: 0,
                height,
                created_at: at(height as i64),
            })
            .unwrap();
    }
    for i in 0..520 {
        store
            .insert_record(&peer(&format!("10.{}.{}.1", i / 256, i % 256), i))
            .unwrap();
    }
    store
}

fn decoded(txid: &str, inputs: &[&str]) -> DecodedTransaction {
    let vin: Vec<Value> = inputs.iter().map(|id| json!({"txid": id, "vout": 0})).collect();
    serde_json::from_value(json!({
        "txid": txid,
        "vin": vin,
        "vout": [
            {"value": 1.0, "n": 0, "scriptPubKey": {"addresses": ["alice"]}},
            {"value": 0.5, "n": 1, "scriptPubKey": {"addresses": ["bob"]}}
        ]
    }))
    .unwrap()
}

fn server_with(store: impl Store + 'static, node: Arc<MemoryNodeClient>) -> TestServer {
    let explorer = Arc::new(Explorer::new(Arc::new(store), node));
    TestServer::new(build_api_router(explorer)).expect("Failed to create test server")
}

fn server() -> (TestServer, Arc<MemoryNodeClient>) {
    let node = Arc::new(MemoryNodeClient::new());
    node.add_transaction("t9", "raw9", decoded("t9", &["t7", "t8", "t7", "unindexed"]));
    (server_with(seeded_store(), node.clone()), node)
}

#[tokio::test]
async fn test_health() {
    let (server, _) = server();
    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_transaction_listings() {
    let (server, _) = server();

    let response = server.get("/api/tx/latest").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json.as_array().unwrap().len(), 10);
    assert_eq!(json[0]["height"], 12);

    let response = server.get("/api/tx").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["pages"], 2);
    assert_eq!(json["txs"].as_array().unwrap().len(), 10);

    let response = server
        .get("/api/tx")
        .add_query_param("skip", "10")
        .add_query_param("limit", "5")
        .await;
    let json: Value = response.json();
    assert_eq!(json["pages"], 3);
    assert_eq!(json["txs"].as_array().unwrap().len(), 2);
    assert_eq!(json["txs"][0]["hash"], "t2");

    let response = server.get("/api/tx").add_query_param("skip", "500").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert!(json["txs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_paging_falls_back_to_defaults() {
    let (server, _) = server();

    let response = server
        .get("/api/tx")
        .add_query_param("skip", "abc")
        .add_query_param("limit", "lots")
        .await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["txs"].as_array().unwrap().len(), 10);
    assert_eq!(json["txs"][0]["hash"], "t12");
}

#[tokio::test]
async fn test_address_transactions() {
    let (server, _) = server();

    let response = server.get("/api/address/alice").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    let heights: Vec<u64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["height"].as_u64().unwrap())
        .collect();
    assert_eq!(heights, vec![12, 10, 8, 6, 4, 2]);

    let response = server.get("/api/address/alice").add_query_param("limit", "2").await;
    let json: Value = response.json();
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_block_detail() {
    let (server, _) = server();

    let response = server.get("/api/block/5").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["block"]["hash"], "b5");
    let txs = json["txs"].as_array().unwrap();
    assert_eq!(txs.len(), 2);
    for summary in txs {
        let keys: Vec<&String> = summary.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(summary["hash"].is_string());
        assert!(summary["createdAt"].is_number());
        assert!(summary["recipients"].is_number());
    }

    let response = server.get("/api/block/b6").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["block"]["height"], 6);
    assert_eq!(json["txs"], json!([]));

    let response = server.get("/api/block/999999999").await;
    assert_eq!(response.status_code(), 404);
    let json: Value = response.json();
    assert_eq!(json["code"], "not_found");
    assert!(json["error"].is_string());

    let response = server.get("/api/block/doesnotexist").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_transaction_detail() {
    let (server, _) = server();

    let response = server.get("/api/tx/t9").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["tx"]["hash"], "t9");
    let mut vin: Vec<&str> = json["vin"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["hash"].as_str().unwrap())
        .collect();
    vin.sort();
    assert_eq!(vin, vec!["t7", "t8"]);
    assert_eq!(json["vout"][0]["n"], 0);
    assert_eq!(json["vout"][1]["value"], 0.5);
    assert_eq!(json["vout"][1]["scriptPubKey"]["addresses"][0], "bob");

    // Height 9 resolves to the same transaction.
    let response = server.get("/api/tx/9").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["tx"]["hash"], "t9");

    let response = server.get("/api/tx/doesnotexist").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_transaction_detail_upstream_failures() {
    let (server, node) = server();

    // Indexed, but the node has never heard of it.
    let response = server.get("/api/tx/t3").await;
    assert_eq!(response.status_code(), 502);
    let json: Value = response.json();
    assert_eq!(json["code"], "upstream_unavailable");

    node.fail_with(Some(FailureMode::Timeout));
    let response = server.get("/api/tx/t9").await;
    assert_eq!(response.status_code(), 502);
    let json: Value = response.json();
    assert!(json.get("tx").is_none());
    assert!(json.get("vout").is_none());
}

#[tokio::test]
async fn test_coin_endpoints() {
    let (server, _) = server();

    let response = server.get("/api/coin").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["supply"], 1002.0);

    let response = server.get("/api/coin/history").add_query_param("limit", "2").await;
    let json: Value = response.json();
    let supplies: Vec<f64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["supply"].as_f64().unwrap())
        .collect();
    assert_eq!(supplies, vec![1002.0, 1001.0]);

    let empty = server_with(MemoryStore::new(), Arc::new(MemoryNodeClient::new()));
    let response = empty.get("/api/coin").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert!(json.is_null());
}

#[tokio::test]
async fn test_masternodes() {
    let (server, _) = server();

    let response = server.get("/api/masternode").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["pages"], 2);
    assert_eq!(json["mns"].as_array().unwrap().len(), 10);
    assert_eq!(json["mns"][0]["height"], 12);
}

#[tokio::test]
async fn test_peer_default_limit() {
    let (server, _) = server();

    let response = server.get("/api/peer").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    let peers = json.as_array().unwrap();
    assert_eq!(peers.len(), 500);
    assert_eq!(peers[0]["ip"], "10.0.0.1");

    let response = server.get("/api/peer/history").await;
    let json: Value = response.json();
    let peers = json.as_array().unwrap();
    assert_eq!(peers.len(), 500);
    assert_eq!(peers[0]["ip"], "10.2.7.1");

    let response = server.get("/api/peer").add_query_param("limit", "0").await;
    let json: Value = response.json();
    assert_eq!(json.as_array().unwrap().len(), 500);
}
