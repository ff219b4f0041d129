//! Document store abstraction over the indexed collections.
//!
//! The explorer only ever reads. Documents are JSON objects grouped in one of
//! five [`Collection`]s and selected with a [`Query`]: an exact-match or
//! set-membership [`Filter`], explicit sort keys, and skip/limit. Rows that
//! tie on every sort key come back in insertion order, so every listing is
//! deterministic.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::error::{ExplorerError, Result};
use crate::model::Record;
use crate::pagination::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Blocks,
    Transactions,
    Coins,
    Masternodes,
    Peers,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Blocks => "blocks",
            Collection::Transactions => "txs",
            Collection::Coins => "coins",
            Collection::Masternodes => "masternodes",
            Collection::Peers => "peers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: &'static str,
    pub order: Order,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document in the collection.
    All,
    /// `field == value`.
    Eq(&'static str, Value),
    /// `field` equals one of `values`. An empty set matches nothing.
    In(&'static str, Vec<Value>),
    /// Array `field` has an element equal to `value`.
    Contains(&'static str, Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub sort: Vec<Sort>,
    pub skip: u64,
    pub limit: Option<u64>,
    pub projection: Option<Vec<&'static str>>,
}

impl Default for Query {
    fn default() -> Self {
        Query::new(Filter::All)
    }
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: Vec::new(),
            skip: 0,
            limit: None,
            projection: None,
        }
    }

    pub fn asc(mut self, field: &'static str) -> Self {
        self.sort.push(Sort {
            field,
            order: Order::Asc,
        });
        self
    }

    pub fn desc(mut self, field: &'static str) -> Self {
        self.sort.push(Sort {
            field,
            order: Order::Desc,
        });
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page(self, page: Page) -> Self {
        self.skip(page.skip()).limit(page.limit())
    }

    /// Return only `fields` from each matching document.
    pub fn select(mut self, fields: &[&'static str]) -> Self {
        self.projection = Some(fields.to_vec());
        self
    }
}

/// Backend holding the indexed documents.
///
/// `insert` exists for the indexer and for seeding tests; nothing in the
/// query layer writes.
pub trait Store: Send + Sync {
    fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>>;
    fn count(&self, collection: Collection, filter: &Filter) -> Result<u64>;
    fn insert(&self, collection: Collection, document: &Value) -> Result<()>;
}

/// Typed access on top of any [`Store`], including `dyn Store`.
pub trait StoreExt: Store {
    fn find_records<R: Record>(&self, query: &Query) -> Result<Vec<R>> {
        self.find(R::COLLECTION, query)?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(ExplorerError::from))
            .collect()
    }

    fn find_one<R: Record>(&self, query: &Query) -> Result<Option<R>> {
        let query = query.clone().limit(1);
        Ok(self.find_records(&query)?.into_iter().next())
    }

    fn count_records<R: Record>(&self, filter: &Filter) -> Result<u64> {
        self.count(R::COLLECTION, filter)
    }

    fn insert_record<R: Record>(&self, record: &R) -> Result<()> {
        let document = serde_json::to_value(record)
            .map_err(|e| ExplorerError::InvalidInput(format!("unserializable record: {}", e)))?;
        self.insert(R::COLLECTION, &document)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Field names end up inside SQL JSON paths, so only plain identifiers pass.
pub(crate) fn check_field(field: &str) -> Result<&str> {
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(field)
    } else {
        Err(ExplorerError::InvalidInput(format!("invalid field name: {:?}", field)))
    }
}

pub(crate) fn check_document(document: &Value) -> Result<()> {
    if document.is_object() {
        Ok(())
    } else {
        Err(ExplorerError::InvalidInput(
            "documents must be JSON objects".to_string(),
        ))
    }
}

pub(crate) fn project(document: Value, fields: &[&'static str]) -> Value {
    let Value::Object(mut source) = document else {
        return document;
    };
    let mut projected = Map::new();
    for field in fields {
        if let Some(value) = source.remove(*field) {
            projected.insert((*field).to_string(), value);
        }
    }
    Value::Object(projected)
}

// Type rank mirrors SQLite's cross-type ordering: NULL < numeric < text < other.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) | Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) | Value::Object(_) => 3,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Total order over JSON values used for in-memory sorting.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match type_rank(a).cmp(&type_rank(b)) {
        Ordering::Equal => {}
        other => return other,
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

/// Equality as a filter sees it: numbers compare by value, null never matches.
pub(crate) fn values_match(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
