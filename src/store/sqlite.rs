//! SQLite-backed document store.
//!
//! All collections share one `documents` table; documents are stored as JSON
//! text and filtered/sorted through SQLite's JSON functions. The autoincrement
//! `id` is the insertion-order tiebreak.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use std::sync::Mutex;

use super::{check_document, check_field, project, Collection, Filter, Order, Query, Store};
use crate::error::{ExplorerError, Result};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            ExplorerError::StorageUnavailable(format!("Failed to open database: {}", e))
        })?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            ExplorerError::StorageUnavailable(format!("Failed to open database: {}", e))
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                body TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_documents_hash
                ON documents(collection, json_extract(body, '$.hash'));
            CREATE INDEX IF NOT EXISTS idx_documents_height
                ON documents(collection, json_extract(body, '$.height'));
            CREATE INDEX IF NOT EXISTS idx_documents_created
                ON documents(collection, json_extract(body, '$.createdAt'));",
        )
        .map_err(|e| {
            ExplorerError::StorageUnavailable(format!("Failed to create documents table: {}", e))
        })?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ExplorerError::StorageUnavailable("Mutex poisoned".to_string()))
    }
}

fn json_path(field: &str) -> Result<String> {
    Ok(format!("json_extract(body, '$.{}')", check_field(field)?))
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => SqlValue::Integer(i),
            (None, Some(f)) => SqlValue::Real(f),
            (None, None) => SqlValue::Null,
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// Render `filter` as a WHERE fragment, appending its bind values to `binds`.
fn filter_sql(filter: &Filter, binds: &mut Vec<SqlValue>) -> Result<String> {
    match filter {
        Filter::All => Ok("1".to_string()),
        Filter::Eq(field, value) => {
            binds.push(to_sql(value));
            Ok(format!("{} = ?", json_path(field)?))
        }
        Filter::In(field, values) => {
            if values.is_empty() {
                return Ok("0".to_string());
            }
            binds.extend(values.iter().map(to_sql));
            let marks = vec!["?"; values.len()].join(", ");
            Ok(format!("{} IN ({})", json_path(field)?, marks))
        }
        Filter::Contains(field, value) => {
            binds.push(to_sql(value));
            Ok(format!(
                "EXISTS (SELECT 1 FROM json_each(body, '$.{}') WHERE json_each.value = ?)",
                check_field(field)?
            ))
        }
    }
}

fn order_sql(query: &Query) -> Result<String> {
    let mut keys = Vec::with_capacity(query.sort.len() + 1);
    for key in &query.sort {
        let direction = match key.order {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        };
        keys.push(format!("{} {}", json_path(key.field)?, direction));
    }
    keys.push("id ASC".to_string());
    Ok(keys.join(", "))
}

impl Store for SqliteStore {
    fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>> {
        let mut binds = vec![SqlValue::Text(collection.name().to_string())];
        let condition = filter_sql(&query.filter, &mut binds)?;
        let order = order_sql(query)?;
        // SQLite treats a negative LIMIT as unbounded.
        let limit = query
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        binds.push(SqlValue::Integer(limit));
        binds.push(SqlValue::Integer(
            i64::try_from(query.skip).unwrap_or(i64::MAX),
        ));

        let sql = format!(
            "SELECT body FROM documents WHERE collection = ? AND ({}) ORDER BY {} LIMIT ? OFFSET ?",
            condition, order
        );
        tracing::debug!(collection = collection.name(), sql = %sql, "store.find");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(binds.iter()), |row| row.get::<_, String>(0))?;

        let mut documents = Vec::new();
        for row in rows {
            let document: Value = serde_json::from_str(&row?)?;
            documents.push(match &query.projection {
                Some(fields) => project(document, fields),
                None => document,
            });
        }
        Ok(documents)
    }

    fn count(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let mut binds = vec![SqlValue::Text(collection.name().to_string())];
        let condition = filter_sql(filter, &mut binds)?;
        let sql = format!(
            "SELECT COUNT(*) FROM documents WHERE collection = ? AND ({})",
            condition
        );

        let conn = self.lock()?;
        let total: i64 = conn.query_row(&sql, params_from_iter(binds.iter()), |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }

    fn insert(&self, collection: Collection, document: &Value) -> Result<()> {
        check_document(document)?;
        let body = serde_json::to_string(document)
            .map_err(|e| ExplorerError::InvalidInput(format!("Failed to serialize document: {}", e)))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, body) VALUES (?1, ?2)",
            params![collection.name(), body],
        )?;
        Ok(())
    }
}
