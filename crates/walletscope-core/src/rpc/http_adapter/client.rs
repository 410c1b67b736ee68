use std::num::{NonZeroU32, NonZeroUsize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use lru::LruCache;
use reqwest::{header, Url};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::{CoreError, RpcError};
use crate::types::{BlockHeight, CanonicalTransaction, TransactionSummary};

use super::super::types::ChainInfo;
use super::super::{NodeRpc, WalletRpc};
use super::connection::{load_certificate, parse_connection, resolve_auth};
use super::parsing::{parse_block_header_height, parse_canonical_transaction, parse_list_transactions};
use super::protocol::{parse_jsonrpc_error, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};

/// Maximum number of block-hash → height entries cached in memory.
const BLOCK_HEIGHT_CACHE_CAP: usize = 10_000;

/// Upper bound for one HTTP exchange. Full-history `listtransactions` calls
/// can be slow; the aggregator applies its own, usually shorter, deadlines.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// JSON-RPC client over HTTP(S) for one wallet or node endpoint.
///
/// The same type serves both roles: wallets answer `listtransactions`, the
/// node answers `getrawtransaction`, `getblockheader` and
/// `getblockchaininfo`. Confirmed block heights are immutable, so an LRU
/// cache maps block hashes to heights without ever invalidating.
pub struct HttpRpcClient {
    client: reqwest::Client,
    url: Url,
    auth: Option<(String, String)>,
    limiter: Option<DirectRateLimiter>,
    next_id: AtomicU64,
    block_height_cache: Mutex<LruCache<BlockHash, BlockHeight>>,
}

impl HttpRpcClient {
    /// Create a new client for an HTTP(S) URL.
    ///
    /// `cert_file` is a PEM certificate to trust in addition to the system
    /// roots, for daemons that serve RPC with a self-signed certificate.
    /// `user` and `pass` must be given together or not at all.
    ///
    /// If `requests_per_second` is set, calls are rate-limited per outbound
    /// HTTP request.
    pub fn new(
        connection: &str,
        user: Option<&str>,
        pass: Option<&str>,
        cert_file: Option<&Path>,
        requests_per_second: Option<u32>,
    ) -> Result<Self, CoreError> {
        let auth = resolve_auth(user, pass)?;
        let url = parse_connection(connection)?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true);
        if let Some(cert_file) = cert_file {
            builder = builder.add_root_certificate(load_certificate(cert_file)?);
        }
        let client = builder
            .build()
            .map_err(|e| CoreError::Config(format!("build rpc client for `{url}`: {e}")))?;

        let limiter = match requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::Config("requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            url,
            auth,
            limiter,
            next_id: AtomicU64::new(initial_request_id()),
            block_height_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(BLOCK_HEIGHT_CACHE_CAP)
                    .expect("BLOCK_HEIGHT_CACHE_CAP is non-zero"),
            )),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError> {
        self.wait_for_rate_limit().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            rpc.url = %self.url,
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            "rpc call"
        );
        let req = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        };

        let mut builder = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&req);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await.map_err(RpcError::Transport)?;
        let status = response.status();

        let body = response.text().await.map_err(RpcError::Transport)?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        // Error replies arrive with non-2xx statuses but still carry a JSON
        // body, so decode first and only fall back to the status.
        let decoded: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            RpcError::InvalidResponse(format!(
                "decode JSON-RPC response (HTTP {status}): {e}; body={body}"
            ))
        })?;

        if let Some(err) = decoded.error.filter(|err| !err.is_null()) {
            return Err(parse_jsonrpc_error(err));
        }

        Ok(decoded.result.unwrap_or(serde_json::Value::Null))
    }

    async fn get_block_height(
        &self,
        block_hash: BlockHash,
    ) -> Result<Option<BlockHeight>, CoreError> {
        if let Some(height) = self.block_height_cache.lock().await.get(&block_hash).copied() {
            return Ok(Some(height));
        }

        let raw = self
            .rpc_call(
                "getblockheader",
                vec![
                    serde_json::json!(block_hash.to_string()),
                    serde_json::json!(true),
                ],
            )
            .await?;
        let height = parse_block_header_height(&raw);
        if let Some(height) = height {
            self.block_height_cache.lock().await.put(block_hash, height);
        }
        Ok(height)
    }
}

#[async_trait]
impl WalletRpc for HttpRpcClient {
    async fn list_account_transactions(
        &self,
        account: &str,
        limit: usize,
    ) -> Result<Vec<TransactionSummary>, CoreError> {
        let raw = self
            .rpc_call(
                "listtransactions",
                vec![serde_json::json!(account), serde_json::json!(limit)],
            )
            .await?;
        parse_list_transactions(raw)
    }
}

#[async_trait]
impl NodeRpc for HttpRpcClient {
    async fn get_canonical_transaction(
        &self,
        txid: &Txid,
    ) -> Result<CanonicalTransaction, CoreError> {
        let raw = self
            .rpc_call(
                "getrawtransaction",
                vec![serde_json::json!(txid.to_string()), serde_json::json!(1)],
            )
            .await
            .map_err(|err| normalize_getrawtransaction_error(txid, err))?;
        let mut tx = parse_canonical_transaction(&raw)?;

        if tx.block_height.is_none() && tx.is_confirmed() {
            if let Some(block_hash) = tx.block_hash {
                tx.block_height = self.get_block_height(block_hash).await?;
            }
        }
        Ok(tx)
    }

    async fn get_chain_info(&self) -> Result<ChainInfo, CoreError> {
        let raw = self.rpc_call("getblockchaininfo", Vec::new()).await?;
        let info: ChainInfo = serde_json::from_value(raw).map_err(|e| {
            CoreError::InvalidTxData(format!("invalid getblockchaininfo result: {e}"))
        })?;
        Ok(info)
    }
}

fn initial_request_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

// ==============================================================================
// RPC Error Normalization
// ==============================================================================

/// Convert "unknown transaction" JSON-RPC responses into `TxNotFound`.
fn normalize_getrawtransaction_error(txid: &Txid, err: CoreError) -> CoreError {
    match err {
        CoreError::Rpc(RpcError::ServerError { code, message })
            if is_tx_not_found_server_error(code, &message) =>
        {
            CoreError::TxNotFound(*txid)
        }
        other => other,
    }
}

fn is_tx_not_found_server_error(code: i64, message: &str) -> bool {
    if code != -5 {
        return false;
    }

    let msg = message.to_ascii_lowercase();
    msg.contains("not found")
        || msg.contains("no information available about transaction")
        || msg.contains("no such mempool or blockchain transaction")
}
