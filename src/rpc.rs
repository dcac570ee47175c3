//! JSON-RPC block source for Ethereum-compatible nodes.
//!
//! Only the two read calls needed to walk a block range are used:
//! `eth_blockNumber` and `eth_getBlockByNumber` with full transactions.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::debug_log;
use crate::error::{Error, Result};
use crate::reqwest_simd_json::{ReqwestSimdJsonExt, parse_json_slice};
use crate::source::BlockSource;
use crate::types::{Block, BlockTransaction};

const NO_PARAMS: [u8; 0] = [];

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcBlock {
    number: String,
    timestamp: String,
    #[serde(default)]
    transactions: Vec<RpcTransaction>,
}

#[derive(Debug, Deserialize)]
struct RpcTransaction {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
}

impl RpcBlock {
    fn into_block(self) -> Result<Block> {
        Ok(Block {
            number: parse_quantity(&self.number)?,
            timestamp: parse_quantity(&self.timestamp)?,
            transactions: self
                .transactions
                .into_iter()
                .map(|tx| BlockTransaction {
                    from: tx.from,
                    to: tx.to,
                })
                .collect(),
        })
    }
}

/// Parse a hex-encoded JSON-RPC quantity such as `"0x1e8480"`.
pub fn parse_quantity(value: &str) -> Result<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| Error::malformed(format!("quantity {value:?} is missing the 0x prefix")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::malformed(format!("invalid quantity {value:?}: {e}")))
}

pub fn format_quantity(value: u64) -> String {
    format!("{value:#x}")
}

fn unwrap_response<T>(method: &str, response: RpcResponse<T>) -> Result<Option<T>> {
    if let Some(error) = response.error {
        return Err(Error::Rpc {
            method: method.to_string(),
            code: error.code,
            message: error.message,
        });
    }
    Ok(response.result)
}

pub struct JsonRpcBlockSource {
    client: Client,
    url: Url,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcBlockSource {
    pub fn new(node_url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(node_url).map_err(|e| Error::connection(node_url, e))?;

        match url.scheme() {
            "http" | "https" => {}
            "ws" | "wss" => {
                return Err(Error::connection(
                    node_url,
                    "websocket endpoints are not supported, use the node's HTTP endpoint",
                ));
            }
            other => {
                return Err(Error::connection(
                    node_url,
                    format!("unsupported scheme {other}"),
                ));
            }
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::connection(node_url, e))?;

        Ok(Self {
            client,
            url,
            endpoint: node_url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// POST one JSON-RPC request and return the raw response body.
    async fn post<P>(&self, method: &str, params: P) -> Result<Vec<u8>>
    where
        P: Serialize + Send,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let start = Instant::now();

        let response = self
            .client
            .post(self.url.clone())
            .simd_json(&request)?
            .send()
            .await
            .map_err(|e| Error::connection(&self.endpoint, e))?;

        if !response.status().is_success() {
            return Err(Error::connection(
                &self.endpoint,
                format!("{method} returned HTTP {}", response.status()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::malformed(format!("failed to read body: {e}")))?;

        debug_log::log(
            "RPC",
            method,
            &format!(
                "id={} {} bytes in {}ms",
                request.id,
                body.len(),
                start.elapsed().as_millis()
            ),
        );

        Ok(body.to_vec())
    }
}

#[async_trait]
impl BlockSource for JsonRpcBlockSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn check_connection(&self) -> Result<u64> {
        let body = self.post("eth_blockNumber", NO_PARAMS).await?;
        decode_block_number_response(&body)
    }

    async fn get_block(&self, number: u64) -> Result<Block> {
        let body = self
            .post("eth_getBlockByNumber", (format_quantity(number), true))
            .await?;
        decode_block_response(number, &body)
    }
}

fn decode_response<T: DeserializeOwned>(method: &str, body: &[u8]) -> Result<Option<T>> {
    let response: RpcResponse<T> = parse_json_slice(body)?;
    unwrap_response(method, response)
}

/// Decode a raw `eth_blockNumber` response body into the head block number.
pub fn decode_block_number_response(body: &[u8]) -> Result<u64> {
    let head: String = decode_response("eth_blockNumber", body)?
        .ok_or_else(|| Error::malformed("eth_blockNumber returned null"))?;
    parse_quantity(&head)
}

/// Decode a raw `eth_getBlockByNumber` response body.
pub fn decode_block_response(number: u64, body: &[u8]) -> Result<Block> {
    decode_response::<RpcBlock>("eth_getBlockByNumber", body)?
        .ok_or(Error::MissingBlock(number))?
        .into_block()
}
