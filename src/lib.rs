//! token-sweep: consolidate funds and tokens from one wallet into another
//!
//! This crate sweeps everything a source wallet holds — plain currency and
//! token-carrying UTXOs — into a receiving wallet, optionally letting the
//! receiver pay the transaction fee. It is a thin orchestration layer: UTXO
//! data comes from a remote indexer, classification into currency vs. token
//! outputs comes from the indexer's metadata, and transaction encoding and
//! signing are delegated to the `bitcoin` crate.
//!
//! # Example
//!
//! ```ignore
//! use token_sweep::{SweepConfig, Sweeper};
//!
//! let config = SweepConfig::from_env();
//! let mut sweeper = Sweeper::new(source_wif, receiver_wif, config)?;
//!
//! sweeper.populate_from_network().await?;
//!
//! let destination = sweeper.receiver.info.token_address.to_string();
//! let tx_hex = sweeper.sweep_to(&destination).await?;
//! let txid = sweeper.broadcast(&tx_hex).await?;
//! ```

// Public modules
pub mod config;
pub mod error;
pub mod indexer;
pub mod sweep;
pub mod transaction;
pub mod wallet;

// Re-exports for convenience
pub use config::SweepConfig;
pub use error::SweepError;
pub use indexer::{ChainIndexer, HttpIndexer, TokenInfo, UtxoEntry, UtxoStatus};
pub use sweep::{token_classes, Sweeper, RECEIVER_FEE_FLOOR_SATS};
pub use transaction::{
    ScriptKind, SigningInput, TxAssembler, DUST_LIMIT_SATS, TOKEN_OUTPUT_SATS,
};
pub use wallet::{expand_wif, partition_utxos, TokenUtxo, Utxo, WalletInfo, WalletState};

// Common result type
pub type Result<T> = std::result::Result<T, SweepError>;
