//! Node-supplied transaction filtering.
//!
//! Every transaction the node selected is classified on its own:
//!
//! - a declared version of [`LEGACY_TX_VERSION`] is rejected;
//! - otherwise the serialized bytes must decode as a transaction.
//!
//! Rejected transactions are logged and left out of the block. Nothing a
//! single transaction does can fail the template as a whole.

use bitcoin::consensus::deserialize;
use bitcoin::Transaction;
use tracing::warn;

use crate::error::TemplateError;
use crate::rpc::TemplateTransaction;

/// Declared version of transactions that are never included.
///
/// Version 1 transactions on this chain may start their input scripts with
/// an opcode where a length is expected, which the decoder cannot handle.
pub const LEGACY_TX_VERSION: i32 = 1;

/// A node-supplied transaction that made it into the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedTransaction {
    /// The template entry, verbatim.
    pub source: TemplateTransaction,
    /// Decoded serialized bytes.
    pub raw: Vec<u8>,
    /// The decoded transaction.
    pub transaction: Transaction,
}

/// Decide whether a single node-supplied transaction can be included.
///
/// # Errors
///
/// - [`TemplateError::LegacyTransactionVersion`] for version 1 transactions.
/// - [`TemplateError::UnparsableTransaction`] if the data is not hex or does
///   not decode.
pub fn classify(tx: &TemplateTransaction) -> Result<AcceptedTransaction, TemplateError> {
    if let Some(version) = tx.version {
        if version == LEGACY_TX_VERSION {
            return Err(TemplateError::LegacyTransactionVersion { version });
        }
    }

    let raw = hex::decode(&tx.data).map_err(|e| TemplateError::UnparsableTransaction {
        reason: e.to_string(),
    })?;
    let transaction: Transaction =
        deserialize(&raw).map_err(|e| TemplateError::UnparsableTransaction {
            reason: e.to_string(),
        })?;

    Ok(AcceptedTransaction {
        source: tx.clone(),
        raw,
        transaction,
    })
}

/// Classify every transaction, keeping the accepted ones in order and
/// logging the rest.
pub fn accept_transactions(txs: &[TemplateTransaction]) -> Vec<AcceptedTransaction> {
    txs.iter()
        .filter_map(|tx| match classify(tx) {
            Ok(accepted) => Some(accepted),
            Err(err) => {
                warn!(error = %err, data = %tx.data, "skipping node transaction");
                None
            }
        })
        .collect()
}
