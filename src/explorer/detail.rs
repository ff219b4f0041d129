//! Block and transaction detail assembly.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;

use super::Explorer;
use crate::error::{ExplorerError, Result};
use crate::model::{Block, Transaction, TxSummary};
use crate::rpc::TxOutput;
use crate::store::{Filter, Query, StoreExt};

/// How a path key selects a block or transaction.
///
/// A key made only of ASCII digits is a height, anything else is a hash. A
/// hash made only of digits is therefore read as a height; this is a known
/// ambiguity kept for compatibility with existing explorer links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Height(u64),
    /// All digits, but too large for any stored height.
    HeightOutOfRange,
    Hash(String),
}

impl LookupKey {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return LookupKey::Hash(raw.to_string());
        }
        match trimmed.parse::<u64>() {
            Ok(height) => LookupKey::Height(height),
            Err(_) => LookupKey::HeightOutOfRange,
        }
    }

    pub fn filter(&self) -> Filter {
        match self {
            LookupKey::Height(height) => Filter::Eq("height", json!(height)),
            LookupKey::HeightOutOfRange => Filter::In("height", Vec::new()),
            LookupKey::Hash(hash) => Filter::Eq("hash", json!(hash)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockDetail {
    pub block: Block,
    pub txs: Vec<TxSummary>,
}

/// A stored transaction joined with the node's live view of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDetail {
    pub tx: Transaction,
    /// Indexed transactions spent by this one, each at most once, unordered.
    /// Inputs whose source is not indexed yet are left out.
    pub vin: Vec<Transaction>,
    /// Outputs exactly as the node reports them, in node order.
    pub vout: Vec<TxOutput>,
}

impl Explorer {
    /// A block plus a summary of each indexed transaction listed in `block.txs`.
    pub async fn block_detail(&self, key: &str) -> Result<BlockDetail> {
        let filter = LookupKey::parse(key).filter();
        let found = self
            .with_store(move |store| {
                let Some(block) = store.find_one::<Block>(&Query::new(filter))? else {
                    return Ok(None);
                };
                let txs: Vec<TxSummary> = if block.txs.is_empty() {
                    Vec::new()
                } else {
                    let ids: Vec<Value> = block.txs.iter().map(|id| json!(id)).collect();
                    let query = Query::new(Filter::In("hash", ids)).select(&TxSummary::FIELDS);
                    store.find_records(&query)?
                };
                Ok(Some(BlockDetail { block, txs }))
            })
            .await?;
        let detail =
            found.ok_or_else(|| ExplorerError::NotFound(format!("block {} not found", key)))?;

        tracing::debug!(
            block = %detail.block.hash,
            listed = detail.block.txs.len(),
            resolved = detail.txs.len(),
            "explorer.block_detail"
        );

        Ok(detail)
    }

    /// Resolve a stored transaction and merge in the node's decoded inputs and
    /// outputs.
    ///
    /// Fails with `NotFound` when the key matches nothing stored and with
    /// `UpstreamUnavailable` on any node failure; nothing partial is returned.
    pub async fn transaction_detail(&self, key: &str) -> Result<TransactionDetail> {
        let filter = LookupKey::parse(key).filter();
        let tx: Transaction = self
            .with_store(move |store| store.find_one(&Query::new(filter)))
            .await?
            .ok_or_else(|| ExplorerError::NotFound(format!("transaction {} not found", key)))?;

        let hex = self.node.get_raw_transaction(&tx.hash).await?;
        let decoded = self.node.decode_raw_transaction(&hex).await?;

        // Coinbase inputs reference no prior transaction.
        let spent: BTreeSet<&str> = decoded
            .vin
            .iter()
            .filter_map(|input| input.txid.as_deref())
            .collect();

        let vin: Vec<Transaction> = if spent.is_empty() {
            Vec::new()
        } else {
            let ids: Vec<Value> = spent.iter().map(|id| json!(id)).collect();
            self.with_store(move |store| store.find_records(&Query::new(Filter::In("hash", ids))))
                .await?
        };

        if vin.len() < spent.len() {
            tracing::debug!(
                tx = %tx.hash,
                referenced = spent.len(),
                indexed = vin.len(),
                "explorer.transaction_detail: inputs not indexed yet"
            );
        }

        Ok(TransactionDetail {
            tx,
            vin,
            vout: decoded.vout,
        })
    }
}
