//! Blockex - read-query layer of a block explorer
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Data
//! - [`model`] - Indexed record kinds (blocks, transactions, coin snapshots, masternodes, peers)
//! - [`store`] - Document store abstraction with SQLite and in-memory backends
//!
//! ## Node
//! - [`rpc`] - Full-node JSON-RPC client
//!
//! ## Queries
//! - [`pagination`] - Stateless skip/limit paging
//! - [`explorer`] - Listings and the block/transaction detail assemblers
//!
//! ## Integration
//! - `api` - REST endpoints (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Data
// ============================================================================
pub mod model;
pub mod store;

// ============================================================================
// Node
// ============================================================================
pub mod rpc;

// ============================================================================
// Queries
// ============================================================================
pub mod explorer;
pub mod pagination;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
