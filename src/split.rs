//! Coinbase split model.
//!
//! The coinbase transaction is handed to the job layer as two segments around
//! the extranonce region of its scriptSig:
//!
//! ```text
//! head || extranonce (17 bytes) || tail
//! ```
//!
//! The job layer keeps `head` and `tail` fixed for the lifetime of a job and
//! varies the extranonce per work assignment.

use bitcoin::consensus::Decodable;
use bitcoin::Transaction;

use crate::error::TemplateError;
use crate::script::{EXTRANONCE_PLACEHOLDER_BYTE, EXTRANONCE_PLACEHOLDER_LEN};

/// A coinbase transaction split into two segments around the extranonce slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseSplit {
    /// Everything before the extranonce in the serialized coinbase transaction.
    /// Includes: version, optional segwit marker, input count, null outpoint,
    /// scriptSig length, height, aux flags, timestamp and extranonce length.
    pub head: Vec<u8>,

    /// Everything after the extranonce in the serialized coinbase transaction.
    /// Includes: pool tag, sequence, outputs, witness, locktime, payload.
    pub tail: Vec<u8>,
}

impl CoinbaseSplit {
    /// Reassemble the raw serialized coinbase with a real extranonce.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedTemplate`] if `extranonce` is not
    /// exactly [`EXTRANONCE_PLACEHOLDER_LEN`] bytes.
    pub fn assemble_raw(&self, extranonce: &[u8]) -> Result<Vec<u8>, TemplateError> {
        if extranonce.len() != EXTRANONCE_PLACEHOLDER_LEN {
            return Err(TemplateError::malformed(
                "extranonce",
                format!(
                    "expected {} bytes, got {}",
                    EXTRANONCE_PLACEHOLDER_LEN,
                    extranonce.len()
                ),
            ));
        }

        let mut raw = Vec::with_capacity(self.total_size());
        raw.extend_from_slice(&self.head);
        raw.extend_from_slice(extranonce);
        raw.extend_from_slice(&self.tail);
        Ok(raw)
    }

    /// The serialized coinbase with the placeholder filler in the extranonce
    /// region, as it appears in the template blob.
    pub fn with_placeholder(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.total_size());
        raw.extend_from_slice(&self.head);
        raw.extend_from_slice(&[EXTRANONCE_PLACEHOLDER_BYTE; EXTRANONCE_PLACEHOLDER_LEN]);
        raw.extend_from_slice(&self.tail);
        raw
    }

    /// Reassemble and decode the coinbase as a [`Transaction`].
    ///
    /// Only the standard transaction fields are decoded; a special
    /// transaction payload after the lock time is left unread.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedTemplate`] for a wrong extranonce
    /// size and [`TemplateError::UnparsableTransaction`] if the bytes do not
    /// decode.
    pub fn assemble(&self, extranonce: &[u8]) -> Result<Transaction, TemplateError> {
        let raw = self.assemble_raw(extranonce)?;
        let mut cursor = &raw[..];
        Transaction::consensus_decode(&mut cursor).map_err(|e| {
            TemplateError::UnparsableTransaction {
                reason: e.to_string(),
            }
        })
    }

    /// Total serialized size of the coinbase transaction.
    pub fn total_size(&self) -> usize {
        self.head.len() + EXTRANONCE_PLACEHOLDER_LEN + self.tail.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split() -> CoinbaseSplit {
        CoinbaseSplit {
            head: vec![0x01, 0x02],
            tail: vec![0x03],
        }
    }

    #[test]
    fn test_assemble_raw() {
        let raw = split().assemble_raw(&[0xaa; 17]).unwrap();
        assert_eq!(raw.len(), 20);
        assert_eq!(&raw[..2], &[0x01, 0x02]);
        assert_eq!(&raw[2..19], &[0xaa; 17]);
        assert_eq!(raw[19], 0x03);
    }

    #[test]
    fn test_assemble_raw_size_mismatch() {
        assert!(matches!(
            split().assemble_raw(&[0xaa; 8]),
            Err(TemplateError::MalformedTemplate {
                field: "extranonce",
                ..
            })
        ));
    }

    #[test]
    fn test_with_placeholder() {
        let raw = split().with_placeholder();
        assert_eq!(raw.len(), split().total_size());
        assert!(raw[2..19].iter().all(|&b| b == EXTRANONCE_PLACEHOLDER_BYTE));
    }

    #[test]
    fn test_assemble_garbage_is_unparsable() {
        assert!(matches!(
            split().assemble(&[0u8; 17]),
            Err(TemplateError::UnparsableTransaction { .. })
        ));
    }
}
