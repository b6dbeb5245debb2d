//! Geth JSON-RPC Chain Source Adapter
//!
//! Implements the `ChainSource` port against a Geth-compatible node over
//! JSON-RPC/HTTP.
//!
//! Every request body is `{"method", "params", "id": 1, "jsonrpc": "2.0"}`
//! and every response must carry a `result` field.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::algorithms::{decode_hex_array, decode_hex_bytes, decode_hex_u64, encode_hex};
use crate::domain::{BlockHeight, BlockParam, RelayError, TxHash};
use crate::ports::outbound::ChainSource;

const METHOD_GET_RAW_HEADER: &str = "debug_getRawHeader";
const METHOD_GET_RAW_BLOCK: &str = "debug_getRawBlock";
const METHOD_GET_RAW_RECEIPTS: &str = "debug_getRawReceipts";
const METHOD_SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";
const METHOD_GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
const METHOD_BLOCK_NUMBER: &str = "eth_blockNumber";

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    method: &'a str,
    params: Vec<Value>,
    id: u8,
    jsonrpc: &'static str,
}

impl<'a> JsonRpcRequest<'a> {
    fn new(method: &'a str, params: Vec<Value>) -> Self {
        Self {
            method,
            params,
            id: 1,
            jsonrpc: "2.0",
        }
    }
}

/// Chain source backed by a Geth node.
pub struct GethRpcSource {
    client: Client,
    url: String,
}

impl GethRpcSource {
    /// Create a source for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RelayError::source)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST one request and return its `result` value.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RelayError> {
        let request = JsonRpcRequest::new(method, params);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(RelayError::source)?;

        if response.status() != StatusCode::OK {
            return Err(RelayError::Source(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let body = response.text().await.map_err(RelayError::source)?;
        extract_result(&body)
    }
}

/// Pull the `result` field out of a JSON-RPC response body.
///
/// A present `null` result is returned as `Value::Null`; an absent one (or an
/// `error` object) is a source error.
pub(crate) fn extract_result(body: &str) -> Result<Value, RelayError> {
    let mut response: Value = serde_json::from_str(body).map_err(RelayError::source)?;

    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(RelayError::Source(format!("RPC error: {}", error)));
    }

    response
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| RelayError::Source("RPC response missing result".to_string()))
}

fn as_hex_str(value: &Value) -> Result<&str, RelayError> {
    value
        .as_str()
        .ok_or_else(|| RelayError::Source(format!("expected hex string, got {}", value)))
}

/// Decode a single hex byte-string result.
pub(crate) fn parse_bytes(result: &Value) -> Result<Vec<u8>, RelayError> {
    decode_hex_bytes(as_hex_str(result)?)
}

/// Decode a list of hex byte-string results, keeping their order.
pub(crate) fn parse_list_of_bytes(result: &Value) -> Result<Vec<Vec<u8>>, RelayError> {
    result
        .as_array()
        .ok_or_else(|| RelayError::Source(format!("expected list, got {}", result)))?
        .iter()
        .map(parse_bytes)
        .collect()
}

#[async_trait]
impl ChainSource for GethRpcSource {
    async fn header(&self, param: BlockParam) -> Result<Vec<u8>, RelayError> {
        let result = self
            .call(METHOD_GET_RAW_HEADER, vec![Value::from(param.to_rpc_param())])
            .await?;
        parse_bytes(&result)
    }

    async fn body(&self, param: BlockParam) -> Result<Vec<u8>, RelayError> {
        let result = self
            .call(METHOD_GET_RAW_BLOCK, vec![Value::from(param.to_rpc_param())])
            .await?;
        parse_bytes(&result)
    }

    async fn receipts(&self, param: BlockParam) -> Result<Vec<Vec<u8>>, RelayError> {
        let result = self
            .call(METHOD_GET_RAW_RECEIPTS, vec![Value::from(param.to_rpc_param())])
            .await?;
        parse_list_of_bytes(&result)
    }

    async fn send_raw_transaction(&self, raw_txn: &[u8]) -> Result<TxHash, RelayError> {
        let result = self
            .call(METHOD_SEND_RAW_TRANSACTION, vec![Value::from(encode_hex(raw_txn))])
            .await?;
        debug!("[geth-rpc] {} returned {}", METHOD_SEND_RAW_TRANSACTION, result);
        decode_hex_array::<32>(as_hex_str(&result)?)
    }

    async fn transaction_receipt(&self, txn_hash: &TxHash) -> Result<Option<Value>, RelayError> {
        let result = self
            .call(METHOD_GET_TRANSACTION_RECEIPT, vec![Value::from(encode_hex(txn_hash))])
            .await?;
        debug!("[geth-rpc] {} returned {}", METHOD_GET_TRANSACTION_RECEIPT, result);
        Ok(match result {
            Value::Null => None,
            receipt => Some(receipt),
        })
    }

    async fn block_number(&self) -> Result<BlockHeight, RelayError> {
        let result = self.call(METHOD_BLOCK_NUMBER, Vec::new()).await?;
        decode_hex_u64(as_hex_str(&result)?)
    }
}
