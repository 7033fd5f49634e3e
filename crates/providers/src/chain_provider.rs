use alloy_eips::BlockNumberOrTag;
use alloy_json_rpc::{RpcRecv, RpcSend};
use alloy_primitives::{B256, U64};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{Block, Filter};
use alloy_transport::TransportError;
use async_trait::async_trait;
use scout_core::{ChainProvider, LogQuery, ProviderError};
use scout_types::{BlockInfo, FilterSpec, Log};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Default per-call timeout.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ChainProvider`] backend over an alloy JSON-RPC client.
///
/// Every call is bounded by a per-call timeout; exceeded timeouts and
/// transport failures surface as transient provider errors, which the
/// tracker retries with backoff.
#[derive(Debug, Clone)]
pub struct AlloyChainProvider {
    client: RpcClient,
    call_timeout: Duration,
}

impl AlloyChainProvider {
    /// Creates a provider over the given RPC client.
    pub const fn new(client: RpcClient) -> Self {
        Self { client, call_timeout: DEFAULT_CALL_TIMEOUT }
    }

    /// Overrides the per-call timeout.
    pub const fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    async fn request<Params, Resp>(
        &self,
        method: &'static str,
        params: Params,
    ) -> Result<Resp, ProviderError>
    where
        Params: RpcSend,
        Resp: RpcRecv,
    {
        match timeout(self.call_timeout, self.client.request(method, params)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(classify(err)),
            Err(_) => Err(ProviderError::Timeout),
        }
    }
}

#[async_trait]
impl ChainProvider for AlloyChainProvider {
    async fn head_number(&self) -> Result<u64, ProviderError> {
        let number: U64 = self.request("eth_blockNumber", ()).await?;
        Ok(number.to::<u64>())
    }

    async fn block_by_number(&self, number: u64) -> Result<BlockInfo, ProviderError> {
        let block: Option<Block> = self
            .request("eth_getBlockByNumber", (BlockNumberOrTag::Number(number), false))
            .await?;
        block.map(into_block_info).ok_or(ProviderError::NotFound)
    }

    async fn block_by_hash(&self, hash: B256) -> Result<BlockInfo, ProviderError> {
        let block: Option<Block> =
            self.request("eth_getBlockByHash", (hash, false)).await?;
        block.map(into_block_info).ok_or(ProviderError::NotFound)
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, ProviderError> {
        let filter = match query {
            LogQuery::Block(hash) => Filter::new().at_block_hash(*hash),
            LogQuery::Range { from, to, filter } => range_filter(*from, *to, filter),
        };
        let logs: Vec<alloy_rpc_types_eth::Log> =
            self.request("eth_getLogs", (filter,)).await?;
        Ok(logs.into_iter().filter_map(into_log).collect())
    }
}

/// Translates a range query into an `eth_getLogs` filter carrying the
/// spec's address and per-slot topic constraints.
fn range_filter(from: u64, to: u64, spec: &FilterSpec) -> Filter {
    let mut filter = Filter::new().from_block(from).to_block(to);
    if !spec.addresses().is_empty() {
        filter = filter.address(spec.addresses().iter().copied().collect::<Vec<_>>());
    }
    for (slot, constraint) in spec.topics().iter().enumerate() {
        let Some(set) = constraint else { continue };
        let topics: Vec<B256> = set.iter().copied().collect();
        filter = match slot {
            0 => filter.event_signature(topics),
            1 => filter.topic1(topics),
            2 => filter.topic2(topics),
            _ => filter.topic3(topics),
        };
    }
    filter
}

fn into_block_info(block: Block) -> BlockInfo {
    BlockInfo::new(block.header.hash, block.header.inner.number, block.header.inner.parent_hash)
}

/// Translates an RPC log. Logs without block references (pending) are
/// skipped.
fn into_log(log: alloy_rpc_types_eth::Log) -> Option<Log> {
    let (Some(block_hash), Some(block_number), Some(log_index)) =
        (log.block_hash, log.block_number, log.log_index)
    else {
        debug!(target: "alloy_provider", "skipping log without block reference");
        return None;
    };
    Some(Log {
        block_hash,
        block_number,
        address: log.inner.address,
        topics: log.inner.data.topics().to_vec(),
        data: log.inner.data.data.clone(),
        log_index: log_index as u32,
    })
}

/// Maps a transport error onto the provider error taxonomy.
///
/// Public endpoints signal an oversized `eth_getLogs` range either with
/// the -32005 limit code or an invalid-params response naming the block
/// range; everything else is transport-level and transient.
fn classify(err: TransportError) -> ProviderError {
    if let TransportError::ErrorResp(payload) = &err {
        let message = payload.message.to_ascii_lowercase();
        if payload.code == -32005
            || (payload.code == -32602 && message.contains("range"))
            || message.contains("block range")
        {
            return ProviderError::RangeTooLarge;
        }
    }
    ProviderError::Transport(Box::new(err))
}
