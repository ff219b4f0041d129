//! Full-node RPC client.
//!
//! The explorer needs exactly two node calls: `getrawtransaction` and
//! `decoderawtransaction`. [`NodeClient`] keeps the generic `call` at the seam
//! so an HTTP client and an in-memory fake are interchangeable.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use thiserror::Error;

use crate::config::RpcConfig;

/// Errors that can occur when talking to the full node.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// A transaction as returned by `decoderawtransaction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedTransaction {
    #[serde(default)]
    pub txid: String,
    pub vin: Vec<TxInput>,
    pub vout: Vec<TxOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    /// Id of the transaction being spent. Absent on coinbase inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vout: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Invoke `method` with positional `params` and return the `result` member.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError>;

    /// Raw hex encoding of `txid`.
    async fn get_raw_transaction(&self, txid: &str) -> Result<String, RpcError> {
        match self.call("getrawtransaction", vec![json!(txid)]).await? {
            Value::String(hex) => Ok(hex),
            other => Err(RpcError::Parse(format!(
                "getrawtransaction returned non-string result: {}",
                other
            ))),
        }
    }

    /// Decode a raw hex transaction into inputs and outputs.
    async fn decode_raw_transaction(&self, hex: &str) -> Result<DecodedTransaction, RpcError> {
        let result = self.call("decoderawtransaction", vec![json!(hex)]).await?;
        serde_json::from_value(result).map_err(|e| RpcError::Parse(e.to_string()))
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// JSON-RPC 1.0 client for a bitcoind-style node.
pub struct HttpNodeClient {
    client: Client,
    url: String,
    auth: Option<(String, Option<String>)>,
    request_id: AtomicU64,
}

impl HttpNodeClient {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RpcError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            auth: config
                .user
                .clone()
                .map(|user| (user, config.password.clone())),
            request_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id: self.next_id(),
            method,
            params,
        };
        tracing::debug!(method, id = request.id, "rpc.call");

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some((user, password)) = &self.auth {
            builder = builder.basic_auth(user, password.as_ref());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RpcError::Timeout
            } else {
                RpcError::Http(e.to_string())
            }
        })?;

        // bitcoind answers RPC-level failures with HTTP 500 and a JSON body, so
        // the status code alone is not an error.
        let body: JsonRpcResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RpcError::Timeout
            } else {
                RpcError::Parse(e.to_string())
            }
        })?;

        if let Some(error) = body.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| RpcError::Parse("Missing result in response".to_string()))
    }
}

/// How [`MemoryNodeClient`] should fail, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Timeout,
    Malformed,
}

/// In-memory node used in tests and offline runs.
#[derive(Debug, Default)]
pub struct MemoryNodeClient {
    raw: RwLock<HashMap<String, String>>,
    decoded: RwLock<HashMap<String, DecodedTransaction>>,
    failure: RwLock<Option<FailureMode>>,
    calls: AtomicU64,
}

impl MemoryNodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tx` under `txid`, served back through `hex`.
    pub fn add_transaction(&self, txid: &str, hex: &str, tx: DecodedTransaction) {
        if let Ok(mut raw) = self.raw.write() {
            raw.insert(txid.to_string(), hex.to_string());
        }
        if let Ok(mut decoded) = self.decoded.write() {
            decoded.insert(hex.to_string(), tx);
        }
    }

    pub fn fail_with(&self, mode: Option<FailureMode>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = mode;
        }
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

fn first_string_param(params: &[Value]) -> Result<&str, RpcError> {
    params
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::Rpc {
            code: -8,
            message: "parameter 1 must be a string".to_string(),
        })
}

#[async_trait]
impl NodeClient for MemoryNodeClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let failure = *self
            .failure
            .read()
            .map_err(|_| RpcError::Http("Mutex poisoned".to_string()))?;
        match failure {
            Some(FailureMode::Timeout) => return Err(RpcError::Timeout),
            Some(FailureMode::Malformed) => return Ok(json!({"unexpected": true})),
            None => {}
        }

        let key = first_string_param(&params)?;
        let not_found = || RpcError::Rpc {
            code: -5,
            message: "No information available about transaction".to_string(),
        };

        match method {
            "getrawtransaction" => {
                let raw = self
                    .raw
                    .read()
                    .map_err(|_| RpcError::Http("Mutex poisoned".to_string()))?;
                raw.get(key).cloned().map(Value::String).ok_or_else(not_found)
            }
            "decoderawtransaction" => {
                let decoded = self
                    .decoded
                    .read()
                    .map_err(|_| RpcError::Http("Mutex poisoned".to_string()))?;
                let tx = decoded.get(key).ok_or_else(|| RpcError::Rpc {
                    code: -22,
                    message: "TX decode failed".to_string(),
                })?;
                serde_json::to_value(tx).map_err(|e| RpcError::Parse(e.to_string()))
            }
            _ => Err(RpcError::Rpc {
                code: -32601,
                message: "Method not found".to_string(),
            }),
        }
    }
}
