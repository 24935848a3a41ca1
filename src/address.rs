//! Payout address resolution.
//!
//! Turns the textual payout addresses found in a node template (smartnode,
//! superblock and founder payees) and the pool's own address into locking
//! scripts.
//!
//! Two address families are understood:
//!
//! - **Base58** legacy addresses: a 25-byte payload
//!   `[version][20-byte hash][4-byte checksum]`, paid with P2PKH.
//! - **Bech32** version 0 witness addresses with a 20-byte program, paid
//!   with P2WPKH.
//!
//! # Examples
//!
//! ```
//! use rtm_template::address::address_to_script;
//!
//! let script = address_to_script("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").unwrap();
//! assert!(script.is_p2pkh());
//!
//! let script = address_to_script("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").unwrap();
//! assert!(script.is_p2wpkh());
//! ```

use bitcoin::bech32::Fe32;
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160};
use bitcoin::opcodes::OP_0;
use bitcoin::script;
use bitcoin::ScriptBuf;

use crate::error::TemplateError;

/// Length of a decoded base58 address: version, hash160, checksum.
pub const BASE58_PAYLOAD_LEN: usize = 25;

/// Length of the public key hash carried by both address families.
pub const PUBKEY_HASH_LEN: usize = 20;

/// Resolve a payout address into its locking script.
///
/// Base58 is tried first. A base58 decode that fails, or that yields anything
/// but 25 bytes, falls through to bech32, where only witness version 0 is
/// accepted.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidAddress`] if neither decoding yields a
/// usable 20-byte hash.
pub fn address_to_script(address: &str) -> Result<ScriptBuf, TemplateError> {
    if let Some(hash) = decode_base58_hash(address) {
        return Ok(p2pkh_script(&hash));
    }

    if let Some(hash) = decode_bech32_hash(address) {
        return Ok(p2wpkh_script(&hash));
    }

    Err(TemplateError::InvalidAddress {
        address: address.to_string(),
    })
}

/// Build `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`.
pub fn p2pkh_script(hash: &[u8; PUBKEY_HASH_LEN]) -> ScriptBuf {
    script::Builder::new()
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(hash)
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// Build `OP_0 <hash>`.
pub fn p2wpkh_script(hash: &[u8; PUBKEY_HASH_LEN]) -> ScriptBuf {
    script::Builder::new()
        .push_opcode(OP_0)
        .push_slice(hash)
        .into_script()
}

/// Decode a base58 address and strip version byte and checksum.
///
/// The checksum is not verified; the node has already vetted the payees it
/// hands out.
fn decode_base58_hash(address: &str) -> Option<[u8; PUBKEY_HASH_LEN]> {
    let decoded = bitcoin::base58::decode(address).ok()?;
    if decoded.len() != BASE58_PAYLOAD_LEN {
        return None;
    }
    decoded[1..BASE58_PAYLOAD_LEN - 4].try_into().ok()
}

/// Decode a version 0 bech32 address carrying a 20-byte witness program.
fn decode_bech32_hash(address: &str) -> Option<[u8; PUBKEY_HASH_LEN]> {
    let (_hrp, version, program) = bitcoin::bech32::segwit::decode(address).ok()?;
    if version != Fe32::Q {
        return None;
    }
    program.as_slice().try_into().ok()
}

/// The recipient of one coinbase output.
///
/// Node templates describe most payees by address, but developer rewards
/// arrive with a ready-made locking script and the pool address is resolved
/// once per build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payee {
    /// A pre-resolved locking script.
    Script(ScriptBuf),
    /// A textual address, resolved with [`address_to_script`].
    Address(String),
}

impl Payee {
    /// Return the locking script for this payee.
    pub fn locking_script(&self) -> Result<ScriptBuf, TemplateError> {
        match self {
            Payee::Script(script) => Ok(script.clone()),
            Payee::Address(address) => address_to_script(address),
        }
    }
}

impl From<ScriptBuf> for Payee {
    fn from(script: ScriptBuf) -> Self {
        Payee::Script(script)
    }
}

impl From<&str> for Payee {
    fn from(address: &str) -> Self {
        Payee::Address(address.to_string())
    }
}
