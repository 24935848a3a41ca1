//! Block template assembly.
//!
//! Produces the hex block blob the job layer hashes and patches:
//!
//! ```text
//! [80-byte header] [tx count] [coinbase head] [17 x 0xcc] [coinbase tail] [node txs...]
//! ```
//!
//! The header's merkle root is left zeroed; it is computed once the coinbase
//! carries a real extranonce. `reserved_offset` is the byte offset of the
//! extranonce region within the blob.

use bitcoin::Transaction;
use primitive_types::U256;
use tracing::debug;

use crate::address::Payee;
use crate::builder::CoinbaseBuilder;
use crate::codec::{
    pack_int32_be, pack_int32_le, pack_uint32_be, pack_uint32_le, reverse_bytes, var_int,
};
use crate::error::TemplateError;
use crate::filter::{self, AcceptedTransaction};
use crate::rpc::RawTemplate;
use crate::script::EXTRANONCE_PLACEHOLDER_LEN;
use crate::split::CoinbaseSplit;

/// Serialized block header size.
pub const BLOCK_HEADER_SIZE: usize = 80;

/// Difficulty-1 target, big-endian.
pub const DIFF1_TARGET: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// A block template ready for job distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockTemplate {
    /// Difficulty of the template target, rounded to 9 decimals.
    pub difficulty: f64,
    pub height: u64,
    /// Previous block hash in internal byte order, hex.
    pub prev_hash: String,
    /// Hex of the full block with placeholder merkle root and extranonce.
    pub blocktemplate_blob: String,
    /// Byte offset of the extranonce region within the blob.
    pub reserved_offset: usize,
    /// Coinbase segments around the extranonce.
    pub coinbase: CoinbaseSplit,
    /// Header version, big-endian hex.
    pub version: String,
    /// Compact target as reported by the node.
    pub bits: String,
    /// Header time, big-endian hex.
    pub curtime: String,
    /// Decoded node transactions included in the blob, in block order.
    pub transactions: Vec<Transaction>,
    accepted: Vec<AcceptedTransaction>,
}

impl BlockTemplate {
    /// Build a template with default settings.
    ///
    /// Shorthand for `TemplateBuilder::new(raw, pool_address).build()`.
    pub fn new(raw: &RawTemplate, pool_address: &str) -> Result<Self, TemplateError> {
        TemplateBuilder::new(raw, pool_address).build()
    }

    /// Merkle leaves in internal byte order: a `None` slot for the coinbase
    /// followed by each included transaction's hash.
    ///
    /// The node's `txid` is preferred over `hash`. A hash missing both, or
    /// shorter than 32 bytes, is zero-padded on the right before reversal.
    pub fn merkle_leaves(&self) -> Vec<Option<[u8; 32]>> {
        core::iter::once(None)
            .chain(self.accepted.iter().map(|tx| {
                let display = tx.source.txid.as_deref().or(tx.source.hash.as_deref());
                Some(uint256_from_hash(display.unwrap_or("")))
            }))
            .collect()
    }

    /// Raw bytes of the included node transactions.
    pub fn transaction_data(&self) -> impl Iterator<Item = &[u8]> {
        self.accepted.iter().map(|tx| tx.raw.as_slice())
    }

    /// The blob bytes with `extranonce` written at [`reserved_offset`].
    ///
    /// [`reserved_offset`]: BlockTemplate::reserved_offset
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedTemplate`] if `extranonce` has the
    /// wrong size or the extranonce region does not lie inside the blob.
    pub fn blob_with_extranonce(&self, extranonce: &[u8]) -> Result<Vec<u8>, TemplateError> {
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
        let mut blob = hex::decode(&self.blocktemplate_blob)
            .map_err(|e| TemplateError::malformed("blocktemplate_blob", e.to_string()))?;
        let end = self.reserved_offset + EXTRANONCE_PLACEHOLDER_LEN;
        let region = blob.get_mut(self.reserved_offset..end).ok_or_else(|| {
            TemplateError::malformed(
                "reserved_offset",
                format!("{}..{} is outside the blob", self.reserved_offset, end),
            )
        })?;
        region.copy_from_slice(extranonce);
        Ok(blob)
    }
}

/// Configures and runs a block template build.
///
/// Defaults:
/// - Timestamp: system clock
/// - Pool tag: [`POOL_TAG`](crate::script::POOL_TAG)
#[derive(Debug, Clone)]
pub struct TemplateBuilder<'a> {
    raw: &'a RawTemplate,
    pool: Payee,
    timestamp: Option<u32>,
    pool_tag: Option<String>,
}

impl<'a> TemplateBuilder<'a> {
    pub fn new(raw: &'a RawTemplate, pool_address: &str) -> Self {
        Self {
            raw,
            pool: Payee::Address(pool_address.to_string()),
            timestamp: None,
            pool_tag: None,
        }
    }

    /// Pay the pool to a pre-resolved locking script instead of an address.
    pub fn pool_payee(mut self, pool: Payee) -> Self {
        self.pool = pool;
        self
    }

    /// Pin the coinbase scriptSig timestamp.
    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_pool_tag(mut self, tag: impl Into<String>) -> Self {
        self.pool_tag = Some(tag.into());
        self
    }

    /// Assemble the block template.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::MalformedTemplate`] for missing or invalid header
    ///   fields, checked before anything is serialized.
    /// - [`TemplateError::InvalidAddress`] and
    ///   [`TemplateError::RewardImbalance`] from reward distribution.
    pub fn build(self) -> Result<BlockTemplate, TemplateError> {
        let raw = self.raw;
        let prev_hash = reverse_bytes(&raw.previous_block_hash()?);
        let bits = raw.bits_bytes()?;
        let difficulty = difficulty(&raw.target_bytes()?)?;

        let mut coinbase = CoinbaseBuilder::from_template(raw, &self.pool)?;
        if let Some(timestamp) = self.timestamp {
            coinbase = coinbase.with_timestamp(timestamp);
        }
        if let Some(tag) = self.pool_tag {
            coinbase = coinbase.with_pool_tag(tag);
        }
        let split = coinbase.build_split()?;

        let accepted = filter::accept_transactions(&raw.transactions);
        let tx_count = var_int(accepted.len() as u64 + 1);

        let mut blob = Vec::with_capacity(
            BLOCK_HEADER_SIZE
                + tx_count.len()
                + split.total_size()
                + accepted.iter().map(|tx| tx.raw.len()).sum::<usize>(),
        );
        blob.extend_from_slice(&pack_int32_le(raw.version));
        blob.extend_from_slice(&prev_hash);
        blob.extend_from_slice(&[0u8; 32]); // merkle root
        blob.extend_from_slice(&pack_uint32_le(raw.curtime));
        blob.extend_from_slice(&u32::from_be_bytes(bits).to_le_bytes());
        blob.extend_from_slice(&[0u8; 4]); // nonce
        blob.extend_from_slice(&tx_count);
        blob.extend_from_slice(&split.with_placeholder());
        for tx in &accepted {
            blob.extend_from_slice(&tx.raw);
        }

        let reserved_offset = BLOCK_HEADER_SIZE + tx_count.len() + split.head.len();

        debug!(
            height = raw.height,
            transactions = accepted.len(),
            skipped = raw.transactions.len() - accepted.len(),
            reserved_offset,
            difficulty,
            "assembled block template"
        );

        Ok(BlockTemplate {
            difficulty,
            height: raw.height,
            prev_hash: hex::encode(&prev_hash),
            blocktemplate_blob: hex::encode(&blob),
            reserved_offset,
            coinbase: split,
            version: hex::encode(pack_int32_be(raw.version)),
            bits: raw.bits.clone().unwrap_or_default(),
            curtime: hex::encode(pack_uint32_be(raw.curtime)),
            transactions: accepted.iter().map(|tx| tx.transaction.clone()).collect(),
            accepted,
        })
    }
}

/// Difficulty of a big-endian target relative to [`DIFF1_TARGET`], rounded
/// to 9 decimal places.
///
/// # Errors
///
/// Returns [`TemplateError::MalformedTemplate`] for a zero target.
pub fn difficulty(target: &[u8]) -> Result<f64, TemplateError> {
    let target = U256::from_big_endian(target);
    if target.is_zero() {
        return Err(TemplateError::malformed("target", "zero target"));
    }
    let ratio = u256_to_f64(U256::from_big_endian(&DIFF1_TARGET)) / u256_to_f64(target);
    Ok((ratio * 1e9).round() / 1e9)
}

fn u256_to_f64(value: U256) -> f64 {
    let high = (value >> 128).low_u128() as f64;
    let low = value.low_u128() as f64;
    high * 2.0f64.powi(128) + low
}

/// Decode a display-order hash into internal order, zero-padding short input.
fn uint256_from_hash(display: &str) -> [u8; 32] {
    let bytes = hex::decode(display).unwrap_or_default();
    let mut padded = [0u8; 32];
    let len = bytes.len().min(32);
    padded[..len].copy_from_slice(&bytes[..len]);
    padded.reverse();
    padded
}
