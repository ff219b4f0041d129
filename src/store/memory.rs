use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{
    check_document, compare_values, project, values_match, Collection, Filter, Order, Query, Store,
};
use crate::error::{ExplorerError, Result};

/// In-memory store, useful for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(document: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::All => true,
        Filter::Eq(field, value) => document
            .get(*field)
            .is_some_and(|found| values_match(found, value)),
        Filter::In(field, values) => document
            .get(*field)
            .is_some_and(|found| values.iter().any(|v| values_match(found, v))),
        Filter::Contains(field, value) => match document.get(*field) {
            Some(Value::Array(items)) => items.iter().any(|item| values_match(item, value)),
            Some(scalar) => values_match(scalar, value),
            None => false,
        },
    }
}

fn poisoned<T>(_: T) -> ExplorerError {
    ExplorerError::StorageUnavailable("Mutex poisoned".to_string())
}

impl Store for MemoryStore {
    fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>> {
        let collections = self.collections.read().map_err(poisoned)?;
        let Some(documents) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut selected: Vec<&Value> = documents
            .iter()
            .filter(|doc| matches(doc, &query.filter))
            .collect();

        // Stable sort keeps insertion order for full ties.
        selected.sort_by(|a, b| {
            query
                .sort
                .iter()
                .map(|key| {
                    let left = a.get(key.field).unwrap_or(&Value::Null);
                    let right = b.get(key.field).unwrap_or(&Value::Null);
                    match key.order {
                        Order::Asc => compare_values(left, right),
                        Order::Desc => compare_values(right, left),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(selected
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| match &query.projection {
                Some(fields) => project(doc.clone(), fields),
                None => doc.clone(),
            })
            .collect())
    }

    fn count(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|doc| matches(doc, filter)).count() as u64)
            .unwrap_or(0))
    }

    fn insert(&self, collection: Collection, document: &Value) -> Result<()> {
        check_document(document)?;
        let mut collections = self.collections.write().map_err(poisoned)?;
        collections
            .entry(collection)
            .or_default()
            .push(document.clone());
        Ok(())
    }
}
