//! SegWit pieces of the coinbase (BIP141).
//!
//! The node hands out the complete commitment script in
//! `default_witness_commitment`; this module only supplies the fixed
//! parts the coinbase needs around it.
//!
//! ## Witness Commitment Structure
//!
//! ```text
//! OP_RETURN OP_PUSHBYTES_36 [aa21a9ed] [32-byte commitment hash]
//! ```
//!
//! A coinbase carrying the commitment is serialized in the extended format:
//! the `00 01` marker follows the version and the input witness (one 32-byte
//! zero element) follows the outputs.

use crate::codec::var_int;

/// Extended serialization marker and flag.
pub const SEGWIT_MARKER: [u8; 2] = [0x00, 0x01];

/// Witness reserved value carried by the coinbase input: 32 zero bytes.
pub const DEFAULT_WITNESS_RESERVED_VALUE: [u8; 32] = [0u8; 32];

/// Serialized coinbase input witness: one stack item holding the reserved
/// value.
///
/// ```
/// use rtm_template::witness::coinbase_witness_stack;
///
/// let stack = coinbase_witness_stack();
/// assert_eq!(stack.len(), 34);
/// assert_eq!(&stack[..2], &[0x01, 0x20]);
/// ```
pub fn coinbase_witness_stack() -> Vec<u8> {
    let mut buf = var_int(1);
    buf.extend_from_slice(&var_int(DEFAULT_WITNESS_RESERVED_VALUE.len() as u64));
    buf.extend_from_slice(&DEFAULT_WITNESS_RESERVED_VALUE);
    buf
}
