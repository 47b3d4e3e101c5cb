/// Common test utilities for sweep integration tests
///
/// Provides an in-memory stand-in for the remote indexer plus a couple of
/// fixture helpers. The mock hands out a cloneable handle so tests can keep
/// seeding data after the sweeper has taken ownership of its copy.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bitcoin::Address;
use token_sweep::{ChainIndexer, SweepConfig, SweepError, Sweeper, UtxoEntry};

// Key pair used across the sweep tests (mainnet, compressed)
pub const SOURCE_WIF: &str = "L22cDXNCqu2eWsGrZw7esnTyE91R7eZA1o7FND6pLGuEXrV8z4B8";
pub const RECEIVER_WIF: &str = "KyvkSiN6gWjQenpkKSQzDh1JphuBYhsanGN5ZCL6bTy81fJL8ank";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn txid(byte: &str) -> String {
    byte.repeat(32)
}

pub fn token_id(byte: &str) -> String {
    byte.repeat(32)
}

pub fn new_sweeper(mock: &MockIndexer) -> Sweeper {
    Sweeper::with_indexer(
        SOURCE_WIF,
        RECEIVER_WIF,
        SweepConfig::default(),
        Box::new(mock.clone()),
    )
    .expect("sweeper construction")
}

pub fn decode_tx(tx_hex: &str) -> bitcoin::Transaction {
    let bytes = hex::decode(tx_hex).expect("transaction hex");
    bitcoin::consensus::encode::deserialize(&bytes).expect("transaction decoding")
}

#[derive(Clone, Default)]
pub struct MockIndexer {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    balances: HashMap<String, u64>,
    utxos: HashMap<String, Vec<UtxoEntry>>,
    broadcasts: Vec<String>,
    failure: Option<String>,
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, address: &Address, sats: u64) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(address.to_string(), sats);
    }

    pub fn add_utxo(&self, address: &Address, entry: UtxoEntry) {
        self.state
            .lock()
            .unwrap()
            .utxos
            .entry(address.to_string())
            .or_default()
            .push(entry);
    }

    /// Make every call fail with the given message from now on.
    pub fn fail_with(&self, message: &str) {
        self.state.lock().unwrap().failure = Some(message.to_string());
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.state.lock().unwrap().broadcasts.clone()
    }
}

#[async_trait]
impl ChainIndexer for MockIndexer {
    async fn address_balance(&self, address: &Address) -> Result<u64, SweepError> {
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.failure {
            return Err(SweepError::Indexer(message.clone()));
        }
        Ok(state
            .balances
            .get(&address.to_string())
            .copied()
            .unwrap_or(0))
    }

    async fn address_utxos(&self, address: &Address) -> Result<Vec<UtxoEntry>, SweepError> {
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.failure {
            return Err(SweepError::Indexer(message.clone()));
        }
        Ok(state
            .utxos
            .get(&address.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String, SweepError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.failure {
            return Err(SweepError::Indexer(message.clone()));
        }

        let bytes = hex::decode(tx_hex).map_err(|e| SweepError::Indexer(e.to_string()))?;
        let tx: bitcoin::Transaction = bitcoin::consensus::encode::deserialize(&bytes)
            .map_err(|e| SweepError::Indexer(e.to_string()))?;

        state.broadcasts.push(tx_hex.to_string());

        Ok(tx.compute_txid().to_string())
    }

    async fn tip_height(&self) -> Result<u64, SweepError> {
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.failure {
            return Err(SweepError::Indexer(message.clone()));
        }
        Ok(100)
    }
}
