//! Sweep orchestration
//!
//! [`Sweeper`] ties the pieces together: expand the two WIFs, pull both
//! wallets' balances and UTXOs from the indexer, classify them, then build
//! and sign the sweep transaction the decision tree calls for.

use std::str::FromStr;

use bitcoin::consensus::encode::serialize_hex;
use bitcoin::{Address, PrivateKey};

use crate::config::SweepConfig;
use crate::error::SweepError;
use crate::indexer::{ChainIndexer, HttpIndexer};
use crate::transaction::{ScriptKind, SigningInput, TxAssembler};
use crate::wallet::{partition_utxos, TokenUtxo, Utxo, WalletState};

/// Minimum receiver balance, in satoshis, for the receiver-pays-fees path
pub const RECEIVER_FEE_FLOOR_SATS: u64 = 3_000;

/// Sweeps everything a source wallet holds into a receiving wallet.
pub struct Sweeper {
    config: SweepConfig,
    indexer: Box<dyn ChainIndexer>,
    pub source: WalletState,
    pub receiver: WalletState,
}

impl Sweeper {
    /// Construct against the indexer named by the configuration.
    pub fn new(
        source_wif: &str,
        receiver_wif: &str,
        config: SweepConfig,
    ) -> Result<Self, SweepError> {
        let indexer = Box::new(HttpIndexer::new(&config.indexer_url));
        Self::with_indexer(source_wif, receiver_wif, config, indexer)
    }

    /// Construct with an explicit indexer implementation.
    pub fn with_indexer(
        source_wif: &str,
        receiver_wif: &str,
        config: SweepConfig,
        indexer: Box<dyn ChainIndexer>,
    ) -> Result<Self, SweepError> {
        if source_wif.trim().is_empty() {
            return Err(SweepError::SourceKeyRequired);
        }
        if receiver_wif.trim().is_empty() {
            return Err(SweepError::ReceiverKeyRequired);
        }

        let source = WalletState::from_wif(source_wif, config.network)?;
        let receiver = WalletState::from_wif(receiver_wif, config.network)?;

        Ok(Self {
            config,
            indexer,
            source,
            receiver,
        })
    }

    pub fn indexer(&self) -> &dyn ChainIndexer {
        self.indexer.as_ref()
    }

    /// Fetch balances and UTXOs for both wallets and classify them.
    ///
    /// Calls run sequentially; any indexer failure is returned as-is.
    pub async fn populate_from_network(&mut self) -> Result<(), SweepError> {
        populate_wallet(self.indexer.as_ref(), &mut self.source).await?;
        populate_wallet(self.indexer.as_ref(), &mut self.receiver).await?;
        Ok(())
    }

    /// Build and sign the transaction sweeping the source wallet to
    /// `destination`, returning its hex encoding.
    ///
    /// Decision policy, in order:
    /// 1. nothing on the source wallet is an error;
    /// 2. currency but no tokens sweeps the currency, fee from the swept
    ///    amount;
    /// 3. tokens move in full, fee from the source's currency UTXOs when it
    ///    has any, otherwise from the receiver (whose balance must clear
    ///    [`RECEIVER_FEE_FLOOR_SATS`]).
    pub async fn sweep_to(&self, destination: &str) -> Result<String, SweepError> {
        let destination = Address::from_str(destination)
            .map_err(|e| SweepError::InvalidAddress(e.to_string()))?
            .require_network(self.config.network)
            .map_err(|e| SweepError::InvalidAddress(e.to_string()))?;

        let source = &self.source;

        if source.currency_utxos.is_empty() && source.token_utxos.is_empty() {
            return Err(SweepError::NothingToSweep);
        }

        let assembler = TxAssembler::new(self.config.network, self.config.fee_rate_sat_vb);

        if source.token_utxos.is_empty() {
            log::info!(
                "Sweeping {} currency UTXOs to {}",
                source.currency_utxos.len(),
                destination
            );

            let tx = assembler.build_currency_sweep(&source.currency_utxos, &destination)?;
            let inputs = signing_inputs(
                &source.currency_utxos,
                source.info.private_key,
                ScriptKind::Legacy,
            );
            let signed = assembler.sign(tx, &inputs)?;

            return Ok(serialize_hex(&signed));
        }

        let classes = token_classes(&source.token_utxos);
        log::info!(
            "Sweeping {} token UTXOs across {} classes to {}",
            source.token_utxos.len(),
            classes.len(),
            destination
        );

        let (fee_utxos, fee_key, change_address) = if !source.currency_utxos.is_empty() {
            // Source pays; residual currency also lands on the destination.
            (
                &source.currency_utxos,
                source.info.private_key,
                destination.clone(),
            )
        } else {
            if self.receiver.currency_utxos.is_empty()
                || self.receiver.balance_sats < RECEIVER_FEE_FLOOR_SATS
            {
                return Err(SweepError::InsufficientFeeFunds);
            }
            log::info!("Source wallet holds no currency, receiver pays the fee");
            (
                &self.receiver.currency_utxos,
                self.receiver.info.private_key,
                self.receiver.info.legacy_address.clone(),
            )
        };

        let tx =
            assembler.build_token_sweep(&source.token_utxos, fee_utxos, &destination, &change_address)?;

        let mut inputs: Vec<SigningInput> = source
            .token_utxos
            .iter()
            .map(|u| SigningInput {
                txid: u.txid.clone(),
                vout: u.vout,
                amount_sats: u.amount_sats,
                key: source.info.private_key,
                kind: ScriptKind::Segwit,
            })
            .collect();
        inputs.extend(signing_inputs(fee_utxos, fee_key, ScriptKind::Legacy));

        let signed = assembler.sign(tx, &inputs)?;

        Ok(serialize_hex(&signed))
    }

    /// Hand a built transaction to the indexer for broadcast.
    pub async fn broadcast(&self, tx_hex: &str) -> Result<String, SweepError> {
        let txid = self.indexer.broadcast(tx_hex).await?;
        log::info!("Broadcast accepted, txid {}", txid);
        Ok(txid)
    }
}

/// Distinct token-class identifiers present in `token_utxos`, in encounter
/// order.
pub fn token_classes(token_utxos: &[TokenUtxo]) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();

    for utxo in token_utxos {
        if !classes.contains(&utxo.token_id) {
            classes.push(utxo.token_id.clone());
        }
    }

    classes
}

async fn populate_wallet(
    indexer: &dyn ChainIndexer,
    wallet: &mut WalletState,
) -> Result<(), SweepError> {
    wallet.balance_sats = indexer
        .address_balance(&wallet.info.legacy_address)
        .await?;

    let legacy_entries = indexer.address_utxos(&wallet.info.legacy_address).await?;
    let (currency, stray_tokens) = partition_utxos(legacy_entries);
    if !stray_tokens.is_empty() {
        log::debug!(
            "Skipping {} token entries reported on legacy address {}",
            stray_tokens.len(),
            wallet.info.legacy_address
        );
    }

    let token_entries = indexer.address_utxos(&wallet.info.token_address).await?;
    let (stray_currency, tokens) = partition_utxos(token_entries);
    if !stray_currency.is_empty() {
        log::debug!(
            "Skipping {} plain entries reported on token address {}",
            stray_currency.len(),
            wallet.info.token_address
        );
    }

    wallet.currency_utxos = currency;
    wallet.token_utxos = tokens;

    log::info!(
        "Wallet {}: {} sats, {} currency UTXOs, {} token UTXOs",
        wallet.info.legacy_address,
        wallet.balance_sats,
        wallet.currency_utxos.len(),
        wallet.token_utxos.len()
    );

    Ok(())
}

fn signing_inputs(utxos: &[Utxo], key: PrivateKey, kind: ScriptKind) -> Vec<SigningInput> {
    utxos
        .iter()
        .map(|u| SigningInput {
            txid: u.txid.clone(),
            vout: u.vout,
            amount_sats: u.amount_sats,
            key,
            kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_utxo(class: &str, amount: u64) -> TokenUtxo {
        TokenUtxo {
            txid: "aa".repeat(32),
            vout: 0,
            amount_sats: 546,
            token_id: class.repeat(32),
            token_amount: amount,
        }
    }

    #[test]
    fn token_classes_of_empty_input_is_empty() {
        assert!(token_classes(&[]).is_empty());
    }

    #[test]
    fn token_classes_deduplicates_one_class() {
        let utxos = vec![token_utxo("aa", 10), token_utxo("aa", 20)];
        assert_eq!(token_classes(&utxos).len(), 1);
    }

    #[test]
    fn token_classes_keeps_distinct_classes_in_order() {
        let utxos = vec![token_utxo("bb", 10), token_utxo("aa", 20)];
        let classes = token_classes(&utxos);

        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0], "bb".repeat(32));
        assert_eq!(classes[1], "aa".repeat(32));
    }
}
