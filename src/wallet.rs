//! Wallet records and key expansion
//!
//! A sweep involves exactly two wallets: the source being emptied and the
//! receiver the funds land on. Each is described by a [`WalletState`]
//! populated once from the indexer.

use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, CompressedPublicKey, Network, NetworkKind, PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};

use crate::error::SweepError;
use crate::indexer::types::UtxoEntry;

/// Plain-currency unspent output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    pub amount_sats: u64,
}

/// Token-carrying unspent output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUtxo {
    pub txid: String,
    pub vout: u32,
    pub amount_sats: u64,
    /// Token-class identifier, 32 bytes hex-encoded
    pub token_id: String,
    /// Token quantity in base units
    pub token_amount: u64,
}

/// Key material and derived addresses of one wallet
#[derive(Debug, Clone)]
pub struct WalletInfo {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
    /// Legacy (P2PKH) address holding plain currency
    pub legacy_address: Address,
    /// Token-aware (P2WPKH) address holding token outputs
    pub token_address: Address,
}

/// One wallet as seen at sweep time: keys plus the balance and classified
/// UTXO sets fetched from the indexer.
#[derive(Debug, Clone)]
pub struct WalletState {
    pub info: WalletInfo,
    /// Confirmed currency balance in satoshis
    pub balance_sats: u64,
    pub currency_utxos: Vec<Utxo>,
    pub token_utxos: Vec<TokenUtxo>,
}

impl WalletState {
    pub fn from_wif(wif: &str, network: Network) -> Result<Self, SweepError> {
        Ok(Self {
            info: expand_wif(wif, network)?,
            balance_sats: 0,
            currency_utxos: Vec::new(),
            token_utxos: Vec::new(),
        })
    }
}

/// Expand a WIF private key into the key pair and both derived addresses.
pub fn expand_wif(wif: &str, network: Network) -> Result<WalletInfo, SweepError> {
    let private_key =
        PrivateKey::from_wif(wif).map_err(|e| SweepError::InvalidWif(e.to_string()))?;

    if private_key.network != NetworkKind::from(network) {
        return Err(SweepError::InvalidWif(format!(
            "key does not match configured network {}",
            network
        )));
    }

    let secp = Secp256k1::new();
    let public_key = private_key.public_key(&secp);

    let legacy_address = Address::p2pkh(&public_key, network);

    let compressed: CompressedPublicKey = public_key.try_into().map_err(|_| {
        SweepError::InvalidWif("uncompressed key cannot derive a token address".to_string())
    })?;
    let token_address = Address::p2wpkh(&compressed, network);

    Ok(WalletInfo {
        private_key,
        public_key,
        legacy_address,
        token_address,
    })
}

/// Split raw indexer entries into currency-only and token-carrying subsets.
pub fn partition_utxos(entries: Vec<UtxoEntry>) -> (Vec<Utxo>, Vec<TokenUtxo>) {
    let mut currency = Vec::new();
    let mut tokens = Vec::new();

    for entry in entries {
        match entry.token {
            Some(info) => tokens.push(TokenUtxo {
                txid: entry.txid,
                vout: entry.vout,
                amount_sats: entry.value,
                token_id: info.token_id,
                token_amount: info.amount,
            }),
            None => currency.push(Utxo {
                txid: entry.txid,
                vout: entry.vout,
                amount_sats: entry.value,
            }),
        }
    }

    (currency, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIF: &str = "L22cDXNCqu2eWsGrZw7esnTyE91R7eZA1o7FND6pLGuEXrV8z4B8";

    #[test]
    fn expand_wif_derives_both_addresses() {
        let info = expand_wif(WIF, Network::Bitcoin).unwrap();

        assert_ne!(info.legacy_address, info.token_address);
        assert_eq!(info.private_key.to_wif(), WIF);
    }

    #[test]
    fn expand_wif_rejects_garbage() {
        let err = expand_wif("not-a-wif", Network::Bitcoin).unwrap_err();
        assert!(matches!(err, SweepError::InvalidWif(_)));
    }

    #[test]
    fn expand_wif_rejects_network_mismatch() {
        let err = expand_wif(WIF, Network::Testnet).unwrap_err();
        assert!(matches!(err, SweepError::InvalidWif(_)));
    }

    #[test]
    fn partition_splits_on_token_metadata() {
        let txid = "aa".repeat(32);
        let entries = vec![
            UtxoEntry::coin(txid.clone(), 0, 10_000),
            UtxoEntry::token(txid.clone(), 1, 546, "bb".repeat(32), 100),
        ];

        let (currency, tokens) = partition_utxos(entries);

        assert_eq!(currency.len(), 1);
        assert_eq!(currency[0].amount_sats, 10_000);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_amount, 100);
    }
}
