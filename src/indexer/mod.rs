//! Remote indexer access
//!
//! - UTXO listing with token classification
//! - Balance lookup
//! - Transaction broadcast

pub mod client;
pub mod types;

pub use client::HttpIndexer;
pub use types::{TokenInfo, UtxoEntry, UtxoStatus};

use async_trait::async_trait;
use bitcoin::Address;

use crate::error::SweepError;

/// Narrow interface over the remote blockchain indexer.
///
/// Production code talks to an esplora-style HTTP indexer through
/// [`HttpIndexer`]; tests substitute an in-memory double.
#[async_trait]
pub trait ChainIndexer: Send + Sync {
    /// Confirmed balance of an address in satoshis.
    async fn address_balance(&self, address: &Address) -> Result<u64, SweepError>;

    /// Unspent outputs of an address, token metadata included.
    async fn address_utxos(&self, address: &Address) -> Result<Vec<UtxoEntry>, SweepError>;

    /// Broadcast a raw transaction, returns the txid.
    async fn broadcast(&self, tx_hex: &str) -> Result<String, SweepError>;

    /// Current chain tip height.
    async fn tip_height(&self) -> Result<u64, SweepError>;
}
