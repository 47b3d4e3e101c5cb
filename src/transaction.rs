//! Sweep transaction assembly and signing

use bitcoin::blockdata::script::{Builder, PushBytesBuf, ScriptBuf};
use bitcoin::blockdata::transaction::{Transaction, TxIn, TxOut};
use bitcoin::blockdata::witness::Witness;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::{OutPoint, Sequence};
use bitcoin::{absolute, Address, Amount, Network, Txid};
use bitcoin::{CompressedPublicKey, PrivateKey, PublicKey};

use crate::error::SweepError;
use crate::wallet::{TokenUtxo, Utxo};

/// Minimum standard output value in satoshis
pub const DUST_LIMIT_SATS: u64 = 546;

/// Value carried by each token output of a sweep
pub const TOKEN_OUTPUT_SATS: u64 = 546;

/// Tag and version prefix of the OP_RETURN transfer manifest
const MANIFEST_TAG: &[u8; 4] = b"SWP\x01";

/// Which sighash algorithm an input requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// P2PKH input, legacy sighash, signature in script_sig
    Legacy,
    /// P2WPKH input, segwit-v0 sighash, signature in the witness
    Segwit,
}

/// Key material for one transaction input
#[derive(Debug, Clone)]
pub struct SigningInput {
    pub txid: String,
    pub vout: u32,
    pub amount_sats: u64,
    pub key: PrivateKey,
    pub kind: ScriptKind,
}

pub struct TxAssembler {
    network: Network,
    fee_rate_sat_vb: u64,
}

impl TxAssembler {
    pub fn new(network: Network, fee_rate_sat_vb: u64) -> Self {
        Self {
            network,
            fee_rate_sat_vb,
        }
    }

    /// Build a transaction that moves all currency inputs to the destination,
    /// fee taken out of the swept amount.
    pub fn build_currency_sweep(
        &self,
        utxos: &[Utxo],
        destination: &Address,
    ) -> Result<Transaction, SweepError> {
        let total_input: u64 = utxos.iter().map(|u| u.amount_sats).sum();
        let fee = self.estimate_tx_size(utxos.len(), 0, 1) * self.fee_rate_sat_vb;

        if total_input < fee + DUST_LIMIT_SATS {
            return Err(SweepError::InsufficientFunds(format!(
                "cannot sweep {} sats: {} sats fee leaves less than the {} sat dust limit",
                total_input, fee, DUST_LIMIT_SATS
            )));
        }

        let mut tx = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: vec![],
            output: vec![],
        };

        for utxo in utxos {
            tx.input.push(TxIn {
                previous_output: OutPoint {
                    txid: parse_txid(&utxo.txid)?,
                    vout: utxo.vout,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            });
        }

        tx.output.push(TxOut {
            value: Amount::from_sat(total_input - fee),
            script_pubkey: destination.script_pubkey(),
        });

        Ok(tx)
    }

    /// Build a transaction that moves every token input to the destination:
    /// an OP_RETURN transfer manifest, one dust-sized token output per class,
    /// and change from the fee inputs to `change_address`.
    pub fn build_token_sweep(
        &self,
        token_utxos: &[TokenUtxo],
        fee_utxos: &[Utxo],
        destination: &Address,
        change_address: &Address,
    ) -> Result<Transaction, SweepError> {
        let classes = class_totals(token_utxos);
        let manifest = transfer_manifest(&classes)?;

        let total_input: u64 = token_utxos.iter().map(|u| u.amount_sats).sum::<u64>()
            + fee_utxos.iter().map(|u| u.amount_sats).sum::<u64>();

        // manifest + one output per class + change
        let estimated_size =
            self.estimate_tx_size(fee_utxos.len(), token_utxos.len(), classes.len() + 2);
        let fee = estimated_size * self.fee_rate_sat_vb;
        let token_outputs_sats = TOKEN_OUTPUT_SATS * classes.len() as u64;

        if total_input < token_outputs_sats + fee {
            return Err(SweepError::InsufficientFunds(format!(
                "need {} sats (token outputs + fee), but inputs carry only {} sats",
                token_outputs_sats + fee,
                total_input
            )));
        }

        let mut tx = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: vec![],
            output: vec![],
        };

        for utxo in token_utxos {
            tx.input.push(TxIn {
                previous_output: OutPoint {
                    txid: parse_txid(&utxo.txid)?,
                    vout: utxo.vout,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            });
        }

        for utxo in fee_utxos {
            tx.input.push(TxIn {
                previous_output: OutPoint {
                    txid: parse_txid(&utxo.txid)?,
                    vout: utxo.vout,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            });
        }

        tx.output.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: manifest,
        });

        for _ in &classes {
            tx.output.push(TxOut {
                value: Amount::from_sat(TOKEN_OUTPUT_SATS),
                script_pubkey: destination.script_pubkey(),
            });
        }

        // Sub-dust change is folded into the fee
        let change = total_input - token_outputs_sats - fee;
        if change >= DUST_LIMIT_SATS {
            tx.output.push(TxOut {
                value: Amount::from_sat(change),
                script_pubkey: change_address.script_pubkey(),
            });
        }

        Ok(tx)
    }

    /// Sign every input with the key its [`SigningInput`] carries, using the
    /// sighash algorithm the input's script type requires.
    pub fn sign(
        &self,
        tx: Transaction,
        inputs: &[SigningInput],
    ) -> Result<Transaction, SweepError> {
        let secp = Secp256k1::new();
        let mut signed_tx = tx.clone();

        for (input_index, input) in tx.input.iter().enumerate() {
            let spend = inputs
                .iter()
                .find(|s| {
                    if let Ok(txid) = s.txid.parse::<Txid>() {
                        txid == input.previous_output.txid && s.vout == input.previous_output.vout
                    } else {
                        false
                    }
                })
                .ok_or_else(|| {
                    SweepError::Transaction("no key material for transaction input".to_string())
                })?;

            let public_key = PublicKey::from_private_key(&secp, &spend.key);

            match spend.kind {
                ScriptKind::Segwit => {
                    let compressed: CompressedPublicKey =
                        public_key.try_into().map_err(|_| {
                            SweepError::Transaction(
                                "uncompressed key cannot sign a segwit input".to_string(),
                            )
                        })?;
                    let script_pubkey =
                        Address::p2wpkh(&compressed, self.network).script_pubkey();

                    let mut sighash_cache = SighashCache::new(&tx);
                    let sighash = sighash_cache
                        .p2wpkh_signature_hash(
                            input_index,
                            &script_pubkey,
                            Amount::from_sat(spend.amount_sats),
                            EcdsaSighashType::All,
                        )
                        .map_err(|e| SweepError::Transaction(e.to_string()))?;

                    let message = Message::from_digest(sighash.to_byte_array());
                    let signature = secp.sign_ecdsa(&message, &spend.key.inner);

                    let mut sig_with_hashtype = signature.serialize_der().to_vec();
                    sig_with_hashtype.push(EcdsaSighashType::All.to_u32() as u8);

                    signed_tx.input[input_index].witness.push(sig_with_hashtype);
                    signed_tx.input[input_index]
                        .witness
                        .push(public_key.to_bytes());
                }
                ScriptKind::Legacy => {
                    let script_pubkey = Address::p2pkh(&public_key, self.network).script_pubkey();

                    let sighash_cache = SighashCache::new(&tx);
                    let sighash = sighash_cache
                        .legacy_signature_hash(
                            input_index,
                            &script_pubkey,
                            EcdsaSighashType::All.to_u32(),
                        )
                        .map_err(|e| SweepError::Transaction(e.to_string()))?;

                    let message = Message::from_digest(sighash.to_byte_array());
                    let signature = secp.sign_ecdsa(&message, &spend.key.inner);

                    let mut sig_with_hashtype = signature.serialize_der().to_vec();
                    sig_with_hashtype.push(EcdsaSighashType::All.to_u32() as u8);

                    let sig_push = PushBytesBuf::try_from(sig_with_hashtype)
                        .map_err(|e| SweepError::Transaction(e.to_string()))?;

                    signed_tx.input[input_index].script_sig = Builder::new()
                        .push_slice(sig_push)
                        .push_key(&public_key)
                        .into_script();
                }
            }
        }

        Ok(signed_tx)
    }

    /// Estimate transaction size in virtual bytes from input and output counts
    fn estimate_tx_size(
        &self,
        legacy_inputs: usize,
        segwit_inputs: usize,
        num_outputs: usize,
    ) -> u64 {
        let base_size = 10;
        let legacy_input_size = 148;
        let segwit_input_size = 68;
        let output_size = 34;

        (base_size
            + (legacy_inputs * legacy_input_size)
            + (segwit_inputs * segwit_input_size)
            + (num_outputs * output_size)) as u64
    }
}

/// Total token quantity per class, in encounter order.
fn class_totals(token_utxos: &[TokenUtxo]) -> Vec<(String, u64)> {
    let mut totals: Vec<(String, u64)> = Vec::new();

    for utxo in token_utxos {
        match totals.iter_mut().find(|(id, _)| id == &utxo.token_id) {
            Some((_, total)) => *total += utxo.token_amount,
            None => totals.push((utxo.token_id.clone(), utxo.token_amount)),
        }
    }

    totals
}

/// OP_RETURN script recording each swept class id and the quantity moved.
fn transfer_manifest(classes: &[(String, u64)]) -> Result<ScriptBuf, SweepError> {
    let mut payload = Vec::with_capacity(4 + classes.len() * 40);
    payload.extend_from_slice(MANIFEST_TAG);

    for (token_id, total) in classes {
        let id = hex::decode(token_id)
            .map_err(|e| SweepError::Transaction(format!("invalid token id {}: {}", token_id, e)))?;
        if id.len() != 32 {
            return Err(SweepError::Transaction(format!(
                "token id {} is not 32 bytes",
                token_id
            )));
        }
        payload.extend_from_slice(&id);
        payload.extend_from_slice(&total.to_be_bytes());
    }

    let data =
        PushBytesBuf::try_from(payload).map_err(|e| SweepError::Transaction(e.to_string()))?;

    Ok(ScriptBuf::new_op_return(data))
}

fn parse_txid(txid: &str) -> Result<Txid, SweepError> {
    txid.parse::<Txid>()
        .map_err(|e| SweepError::Transaction(format!("invalid txid {}: {}", txid, e)))
}
