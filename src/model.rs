//! Indexed record kinds served by the explorer.
//!
//! Records are written by the indexer and are read-only here. Field names are
//! camelCase on the wire and in storage, which is also what query filters and
//! sort keys refer to. Timestamps are stored as milliseconds since the epoch so
//! that they order numerically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Collection;

/// A stored document kind bound to the collection it lives in.
pub trait Record: Serialize + serde::de::DeserializeOwned + Send {
    const COLLECTION: Collection;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub hash: String,
    pub height: u64,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub merkle_root: String,
    #[serde(default)]
    pub bits: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub ver: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Authoritative list of the transaction ids in this block.
    #[serde(default)]
    pub txs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    /// Height of the containing block.
    pub height: u64,
    #[serde(default)]
    pub block_hash: String,
    /// Every address appearing in the inputs or outputs.
    #[serde(default)]
    pub addrs: Vec<String>,
    #[serde(default)]
    pub recipients: u32,
    #[serde(default)]
    pub value: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Narrow projection of a transaction used in block summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSummary {
    pub hash: String,
    #[serde(default)]
    pub recipients: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl TxSummary {
    pub const FIELDS: [&'static str; 3] = ["createdAt", "hash", "recipients"];
}

/// Aggregate coin-supply statistics at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinSnapshot {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub blocks: u64,
    #[serde(default)]
    pub btc: f64,
    #[serde(default)]
    pub usd: f64,
    #[serde(default)]
    pub cap: f64,
    #[serde(default)]
    pub diff: f64,
    #[serde(default)]
    pub mn_on: u32,
    #[serde(default)]
    pub mn_off: u32,
    #[serde(default)]
    pub net_hash: f64,
    #[serde(default)]
    pub peers: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub supply: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Masternode {
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub txhash: String,
    #[serde(default)]
    pub outidx: u32,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub lastseen: u64,
    #[serde(default)]
    pub lastpaid: u64,
    /// Block height at which this state was observed.
    pub height: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sub_version: String,
    #[serde(default)]
    pub ver: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for Block {
    const COLLECTION: Collection = Collection::Blocks;
}

impl Record for Transaction {
    const COLLECTION: Collection = Collection::Transactions;
}

// Projected rows come out of the transactions collection.
impl Record for TxSummary {
    const COLLECTION: Collection = Collection::Transactions;
}

impl Record for CoinSnapshot {
    const COLLECTION: Collection = Collection::Coins;
}

impl Record for Masternode {
    const COLLECTION: Collection = Collection::Masternodes;
}

impl Record for Peer {
    const COLLECTION: Collection = Collection::Peers;
}
