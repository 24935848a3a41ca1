//! Builder for the split coinbase transaction.
//!
//! The [`CoinbaseBuilder`] serializes the synthetic first transaction of a
//! block directly into the [`CoinbaseSplit`] head and tail segments.
//!
//! # Examples
//!
//! ```
//! use rtm_template::builder::CoinbaseBuilder;
//! use rtm_template::address::Payee;
//! use rtm_template::rpc::RawTemplate;
//!
//! let raw = RawTemplate {
//!     height: 1000,
//!     coinbasevalue: 5_000_000_000,
//!     ..Default::default()
//! };
//! let pool = Payee::from("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
//!
//! let split = CoinbaseBuilder::from_template(&raw, &pool)
//!     .unwrap()
//!     .with_timestamp(1_600_000_000)
//!     .build_split()
//!     .unwrap();
//!
//! let tx = split.assemble(&[0u8; 17]).unwrap();
//! assert!(tx.is_coinbase());
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use crate::address::Payee;
use crate::codec::{pack_uint16_le, pack_uint32_le, var_int};
use crate::error::TemplateError;
use crate::reward::{self, CoinbaseOutputs};
use crate::rpc::RawTemplate;
use crate::script::{self, POOL_TAG};
use crate::split::CoinbaseSplit;
use crate::witness::SEGWIT_MARKER;

/// The coinbase version word: a major version and a type, each a 16-bit
/// little-endian half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinbaseVersion {
    pub major: u16,
    pub feature: u16,
}

impl CoinbaseVersion {
    /// Plain version 1 transaction, used when the block pays a developer reward.
    pub const DEV_REWARD: CoinbaseVersion = CoinbaseVersion {
        major: 1,
        feature: 0,
    };

    /// Version 3 special transaction of type 5 (coinbase with payload).
    pub const SPECIAL: CoinbaseVersion = CoinbaseVersion {
        major: 3,
        feature: 5,
    };

    /// Pick the version for a template.
    pub fn for_template(raw: &RawTemplate) -> Self {
        if raw.coinbasedevreward.is_some() {
            Self::DEV_REWARD
        } else {
            Self::SPECIAL
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        let mut buf = [0u8; 4];
        buf[..2].copy_from_slice(&pack_uint16_le(self.major));
        buf[2..].copy_from_slice(&pack_uint16_le(self.feature));
        buf
    }
}

/// Builder for the split coinbase transaction.
///
/// Defaults:
/// - Version: [`CoinbaseVersion::SPECIAL`]
/// - Aux flags: none
/// - Timestamp: system clock at [`build_split`](CoinbaseBuilder::build_split)
/// - Pool tag: [`POOL_TAG`]
/// - Payload: none
#[derive(Debug, Clone)]
pub struct CoinbaseBuilder {
    height: u64,
    version: CoinbaseVersion,
    outputs: CoinbaseOutputs,
    aux_flags: Vec<u8>,
    timestamp: Option<u32>,
    pool_tag: String,
    payload: Option<Vec<u8>>,
}

impl CoinbaseBuilder {
    /// Create a builder for a coinbase at `height` paying `outputs`.
    pub fn new(height: u64, outputs: CoinbaseOutputs) -> Self {
        Self {
            height,
            version: CoinbaseVersion::SPECIAL,
            outputs,
            aux_flags: Vec::new(),
            timestamp: None,
            pool_tag: POOL_TAG.to_string(),
            payload: None,
        }
    }

    /// Create a builder configured from a node template.
    ///
    /// Distributes the reward (see [`reward::distribute`]) and takes the
    /// version, aux flags and payload from `raw`.
    ///
    /// # Errors
    ///
    /// Propagates reward distribution and hex decoding errors.
    pub fn from_template(raw: &RawTemplate, pool: &Payee) -> Result<Self, TemplateError> {
        let outputs = reward::distribute(raw, pool)?;
        let mut builder = Self::new(raw.height, outputs)
            .version(CoinbaseVersion::for_template(raw))
            .with_aux(raw.aux_flags()?);
        if let Some(payload) = raw.payload()? {
            builder = builder.with_payload(payload);
        }
        Ok(builder)
    }

    pub fn version(mut self, version: CoinbaseVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the raw aux flag bytes written after the height.
    pub fn with_aux(mut self, flags: Vec<u8>) -> Self {
        self.aux_flags = flags;
        self
    }

    /// Pin the scriptSig timestamp instead of reading the system clock.
    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_pool_tag(mut self, tag: impl Into<String>) -> Self {
        self.pool_tag = tag.into();
        self
    }

    /// Set the special transaction payload written after the lock time.
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn outputs(&self) -> &CoinbaseOutputs {
        &self.outputs
    }

    /// Serialize the coinbase and split it around the extranonce region.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedTemplate`] if the scriptSig exceeds
    /// the consensus limit.
    pub fn build_split(&self) -> Result<CoinbaseSplit, TemplateError> {
        let timestamp = self.timestamp.unwrap_or_else(unix_now);
        let script_sig =
            script::build_script_sig(self.height, &self.aux_flags, timestamp, &self.pool_tag)?;

        let mut head = Vec::with_capacity(64);
        head.extend_from_slice(&self.version.to_bytes());
        if self.outputs.has_witness_commitment() {
            head.extend_from_slice(&SEGWIT_MARKER);
        }
        head.extend_from_slice(&var_int(1)); // input count
        head.extend_from_slice(&[0u8; 32]); // null prevout hash
        head.extend_from_slice(&pack_uint32_le(u32::MAX)); // null prevout index
        head.extend_from_slice(&var_int(script_sig.script_len() as u64));
        head.extend_from_slice(&script_sig.prefix);

        let mut tail = Vec::with_capacity(128);
        tail.extend_from_slice(&script_sig.suffix);
        tail.extend_from_slice(&pack_uint32_le(0)); // sequence
        tail.extend_from_slice(&self.outputs.serialize());
        tail.extend_from_slice(&pack_uint32_le(0)); // lock time
        if let Some(payload) = &self.payload {
            tail.extend_from_slice(&var_int(payload.len() as u64));
            tail.extend_from_slice(payload);
        }

        Ok(CoinbaseSplit { head, tail })
    }
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default()
}
