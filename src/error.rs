//! Error types for the explorer query layer

use std::fmt;

use crate::rpc::RpcError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerError {
    /// The primary lookup key matched no stored record.
    NotFound(String),
    /// Input that cannot be defaulted. Paging parameters never end up here.
    InvalidInput(String),
    /// The full node failed, timed out or answered with something undecodable.
    UpstreamUnavailable(String),
    /// The document store failed for infrastructural reasons.
    StorageUnavailable(String),
}

impl ExplorerError {
    /// Stable machine-readable kind, surfaced to HTTP callers.
    pub fn code(&self) -> &'static str {
        match self {
            ExplorerError::NotFound(_) => "not_found",
            ExplorerError::InvalidInput(_) => "invalid_input",
            ExplorerError::UpstreamUnavailable(_) => "upstream_unavailable",
            ExplorerError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExplorerError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ExplorerError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ExplorerError::UpstreamUnavailable(msg) => write!(f, "Upstream node unavailable: {}", msg),
            ExplorerError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ExplorerError {}

impl From<rusqlite::Error> for ExplorerError {
    fn from(err: rusqlite::Error) -> Self {
        ExplorerError::StorageUnavailable(err.to_string())
    }
}

// A stored document that no longer matches its record type is a storage fault,
// not a caller mistake.
impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::StorageUnavailable(format!("malformed document: {}", err))
    }
}

impl From<RpcError> for ExplorerError {
    fn from(err: RpcError) -> Self {
        ExplorerError::UpstreamUnavailable(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ExplorerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_errors_are_upstream() {
        let err: ExplorerError = RpcError::Timeout.into();
        assert_eq!(err.code(), "upstream_unavailable");
    }

    #[test]
    fn test_sqlite_errors_are_storage() {
        let err: ExplorerError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, ExplorerError::StorageUnavailable(_)));
    }
}
