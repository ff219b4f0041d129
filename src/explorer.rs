//! Explorer query service.
//!
//! [`Explorer`] owns the two injected collaborators, a [`Store`] with the
//! indexed documents and a [`NodeClient`] for live node data, and exposes one
//! method per read operation. Listings are plain store queries with an explicit
//! sort order; the detail assemblers live in [`detail`].

pub mod detail;

pub use detail::{BlockDetail, LookupKey, TransactionDetail};

use serde::Serialize;
use std::sync::Arc;

use crate::error::{ExplorerError, Result};
use crate::model::{CoinSnapshot, Masternode, Peer, Transaction};
use crate::pagination::{Page, LATEST_TX_LIMIT};
use crate::rpc::NodeClient;
use crate::store::{Filter, Query, Store, StoreExt};

/// Masternodes page with the total page count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasternodePage {
    pub mns: Vec<Masternode>,
    pub pages: u64,
}

/// Transactions page with the total page count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionPage {
    pub txs: Vec<Transaction>,
    pub pages: u64,
}

#[derive(Clone)]
pub struct Explorer {
    store: Arc<dyn Store>,
    node: Arc<dyn NodeClient>,
}

impl Explorer {
    pub fn new(store: Arc<dyn Store>, node: Arc<dyn NodeClient>) -> Self {
        Self { store, node }
    }

    /// Run `f` against the store on the blocking pool.
    ///
    /// Store backends do synchronous I/O, so they never run on a runtime
    /// worker thread.
    pub(crate) async fn with_store<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Store) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| ExplorerError::StorageUnavailable(format!("store task failed: {}", e)))?
    }

    /// Transactions touching `address`, newest block first.
    pub async fn address_transactions(&self, address: &str, page: Page) -> Result<Vec<Transaction>> {
        let query = Query::new(Filter::Contains("addrs", address.into()))
            .desc("height")
            .page(page);
        self.with_store(move |store| store.find_records(&query)).await
    }

    /// Most recent coin snapshot, if any has been indexed yet.
    pub async fn latest_coin(&self) -> Result<Option<CoinSnapshot>> {
        self.with_store(|store| store.find_one(&Query::default().desc("createdAt")))
            .await
    }

    pub async fn coin_history(&self, page: Page) -> Result<Vec<CoinSnapshot>> {
        let query = Query::default().desc("createdAt").page(page);
        self.with_store(move |store| store.find_records(&query)).await
    }

    pub async fn masternodes(&self, page: Page) -> Result<MasternodePage> {
        self.with_store(move |store| {
            let total = store.count_records::<Masternode>(&Filter::All)?;
            let mns = store.find_records(&Query::default().desc("height").page(page))?;
            Ok(MasternodePage {
                mns,
                pages: page.pages(total),
            })
        })
        .await
    }

    /// Current peers ordered by address.
    pub async fn peers(&self, page: Page) -> Result<Vec<Peer>> {
        let query = Query::default().asc("ip").page(page);
        self.with_store(move |store| store.find_records(&query)).await
    }

    /// Every recorded peer sighting, newest first.
    pub async fn peer_history(&self, page: Page) -> Result<Vec<Peer>> {
        let query = Query::default().desc("createdAt").asc("ip").page(page);
        self.with_store(move |store| store.find_records(&query)).await
    }

    /// The ten most recent transactions. Not pageable.
    pub async fn latest_transactions(&self) -> Result<Vec<Transaction>> {
        let query = Query::default().desc("height").page(Page::first(LATEST_TX_LIMIT));
        self.with_store(move |store| store.find_records(&query)).await
    }

    pub async fn transactions(&self, page: Page) -> Result<TransactionPage> {
        self.with_store(move |store| {
            let total = store.count_records::<Transaction>(&Filter::All)?;
            let txs = store.find_records(&Query::default().desc("height").page(page))?;
            Ok(TransactionPage {
                txs,
                pages: page.pages(total),
            })
        })
        .await
    }
}
