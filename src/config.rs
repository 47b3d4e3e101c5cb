/// Sweep configuration from environment variables
///
/// Controls the network, the indexer API endpoint and the fee rate.
/// Defaults to mainnet against mempool.space.
use std::env;

use bitcoin::Network;

#[derive(Clone, Debug)]
pub struct SweepConfig {
    /// Network the wallets live on
    pub network: Network,
    /// Indexer API base URL
    pub indexer_url: String,
    /// Fee rate in sat/vB used for every sweep transaction
    pub fee_rate_sat_vb: u64,
}

impl SweepConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SWEEP_NETWORK`: "bitcoin" (default), "testnet", "signet" or "regtest"
    /// - `INDEXER_URL`: indexer API endpoint (optional, has per-network defaults)
    /// - `FEE_RATE`: fee rate in sat/vB (optional, defaults to 1)
    pub fn from_env() -> Self {
        let network_str = env::var("SWEEP_NETWORK")
            .unwrap_or_else(|_| "bitcoin".to_string())
            .to_lowercase();

        let network = match network_str.as_str() {
            "bitcoin" | "mainnet" | "" => Network::Bitcoin,
            "testnet" => Network::Testnet,
            "signet" => Network::Signet,
            "regtest" => Network::Regtest,
            other => {
                log::warn!("Unknown network '{}', defaulting to mainnet", other);
                Network::Bitcoin
            }
        };

        let indexer_url = env::var("INDEXER_URL").unwrap_or_else(|_| {
            let default_url = match network {
                Network::Testnet => "https://mempool.space/testnet/api",
                Network::Signet => "https://mempool.space/signet/api",
                Network::Regtest => "http://localhost:3000",
                _ => "https://mempool.space/api",
            };
            default_url.to_string()
        });

        let fee_rate_sat_vb = env::var("FEE_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        log::info!(
            "Sweep config: network={}, indexer={}, fee rate={} sat/vB",
            network,
            indexer_url,
            fee_rate_sat_vb
        );

        Self {
            network,
            indexer_url,
            fee_rate_sat_vb,
        }
    }
}

impl Default for SweepConfig {
    /// Default configuration (mainnet)
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            indexer_url: "https://mempool.space/api".to_string(),
            fee_rate_sat_vb: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_mainnet() {
        let config = SweepConfig::default();
        assert!(matches!(config.network, Network::Bitcoin));
        assert_eq!(config.fee_rate_sat_vb, 1);
    }
}
