//! Alloy-backed [`ChainProvider`](scout_core::ChainProvider)
//! implementation.
//!
//! Serves the tracker's remote queries over a JSON-RPC transport built
//! with [`alloy_rpc_client::RpcClient`], translating responses into
//! scout types and classifying provider rejections.

mod chain_provider;
pub use chain_provider::AlloyChainProvider;
