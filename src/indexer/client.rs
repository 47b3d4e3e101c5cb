use async_trait::async_trait;
use bitcoin::Address;

use crate::error::SweepError;
use crate::indexer::types::UtxoEntry;
use crate::indexer::ChainIndexer;

/// HTTP client for an esplora-style indexer with token-aware UTXO listings.
pub struct HttpIndexer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIndexer {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChainIndexer for HttpIndexer {
    async fn address_balance(&self, address: &Address) -> Result<u64, SweepError> {
        let url = format!("{}/address/{}", self.base_url, address);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SweepError::Indexer(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SweepError::Indexer(format!(
                "balance query for {} failed with status {}",
                address,
                response.status()
            )));
        }

        let addr_info: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SweepError::Indexer(e.to_string()))?;

        let funded = addr_info["chain_stats"]["funded_txo_sum"]
            .as_u64()
            .unwrap_or(0);
        let spent = addr_info["chain_stats"]["spent_txo_sum"]
            .as_u64()
            .unwrap_or(0);

        Ok(funded.saturating_sub(spent))
    }

    async fn address_utxos(&self, address: &Address) -> Result<Vec<UtxoEntry>, SweepError> {
        let url = format!("{}/address/{}/utxo", self.base_url, address);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SweepError::Indexer(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SweepError::Indexer(format!(
                "UTXO query for {} failed with status {}",
                address,
                response.status()
            )));
        }

        let utxos: Vec<UtxoEntry> = response
            .json()
            .await
            .map_err(|e| SweepError::Indexer(e.to_string()))?;

        log::debug!("Indexer returned {} UTXOs for {}", utxos.len(), address);

        Ok(utxos)
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String, SweepError> {
        let url = format!("{}/tx", self.base_url);

        log::debug!("Broadcasting transaction to: {}", url);

        let response = self
            .client
            .post(&url)
            .body(tx_hex.to_string())
            .send()
            .await
            .map_err(|e| SweepError::Indexer(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SweepError::Indexer(format!(
                "broadcast failed: {}",
                error_text
            )));
        }

        let txid = response
            .text()
            .await
            .map_err(|e| SweepError::Indexer(e.to_string()))?;

        Ok(txid)
    }

    async fn tip_height(&self) -> Result<u64, SweepError> {
        let url = format!("{}/blocks/tip/height", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SweepError::Indexer(e.to_string()))?;

        let height: u64 = response
            .text()
            .await
            .map_err(|e| SweepError::Indexer(e.to_string()))?
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| SweepError::Indexer(e.to_string()))?;

        Ok(height)
    }
}
