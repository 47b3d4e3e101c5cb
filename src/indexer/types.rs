/// Indexer API response types
///
/// These types match the indexer's JSON format. The UTXO listing is
/// esplora-shaped, extended with optional token metadata per entry.
use serde::{Deserialize, Serialize};

/// UTXO entry from /address/{address}/utxo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    pub status: UtxoStatus,
    /// Token metadata, present when the output carries tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoStatus {
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
}

/// Token metadata attached to a token-carrying output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Token-class identifier, 32 bytes hex-encoded
    pub token_id: String,
    /// Token quantity carried by the output, in base units
    pub amount: u64,
}

impl UtxoEntry {
    /// Plain-currency entry with no token metadata
    pub fn coin(txid: impl Into<String>, vout: u32, value: u64) -> Self {
        Self {
            txid: txid.into(),
            vout,
            value,
            status: UtxoStatus {
                confirmed: true,
                block_height: None,
            },
            token: None,
        }
    }

    /// Token-carrying entry
    pub fn token(
        txid: impl Into<String>,
        vout: u32,
        value: u64,
        token_id: impl Into<String>,
        amount: u64,
    ) -> Self {
        Self {
            txid: txid.into(),
            vout,
            value,
            status: UtxoStatus {
                confirmed: true,
                block_height: None,
            },
            token: Some(TokenInfo {
                token_id: token_id.into(),
                amount,
            }),
        }
    }
}
