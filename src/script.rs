//! Coinbase scriptSig construction.
//!
//! ## ScriptSig Layout
//!
//! ```text
//! [height push] [aux flags] [timestamp push] [0x11] <17-byte extranonce> [pool tag]
//! \_____________________ prefix ______________________/                   \_ suffix _/
//! ```
//!
//! The extranonce region is never written here. The coinbase is split around
//! it and the job layer splices the real extranonce in per worker.
//!
//! The total scriptSig must be between 2 and 100 bytes (consensus rule).

use crate::codec::{deserialize_number, serialize_number, serialize_string};
use crate::error::TemplateError;

/// Maximum coinbase scriptSig size in bytes (consensus rule).
pub const MAX_COINBASE_SCRIPT_SIZE: usize = 100;

/// Bytes reserved in the scriptSig for the extranonce.
pub const EXTRANONCE_PLACEHOLDER_LEN: usize = 17;

/// Filler written into the extranonce region of the template blob.
pub const EXTRANONCE_PLACEHOLDER_BYTE: u8 = 0xcc;

/// Tag identifying the pool software, appended after the extranonce.
pub const POOL_TAG: &str = "/nodeStratum/";

/// The two halves of the coinbase scriptSig around the extranonce region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSigParts {
    /// Height, aux flags, timestamp and the extranonce length byte.
    pub prefix: Vec<u8>,
    /// Length-prefixed pool tag.
    pub suffix: Vec<u8>,
}

impl ScriptSigParts {
    /// Full scriptSig length, extranonce region included.
    pub fn script_len(&self) -> usize {
        self.prefix.len() + EXTRANONCE_PLACEHOLDER_LEN + self.suffix.len()
    }
}

/// Build the scriptSig halves for a block.
///
/// # Arguments
///
/// * `height` - Block height, pushed first per BIP34.
/// * `aux_flags` - Raw `coinbaseaux.flags` bytes, written unpushed.
/// * `timestamp` - Unix seconds, pushed as a script number.
/// * `pool_tag` - Pool identifier, length-prefixed after the extranonce.
///
/// # Errors
///
/// Returns [`TemplateError::MalformedTemplate`] if the aux flags push the
/// scriptSig past [`MAX_COINBASE_SCRIPT_SIZE`].
///
/// # Examples
///
/// ```
/// use rtm_template::script::{build_script_sig, EXTRANONCE_PLACEHOLDER_LEN};
///
/// let parts = build_script_sig(1000, &[], 1_600_000_000, "/nodeStratum/").unwrap();
/// // 1000 = 0x03e8: push 2 bytes [e8, 03]
/// assert_eq!(&parts.prefix[..3], &[0x02, 0xe8, 0x03]);
/// assert_eq!(*parts.prefix.last().unwrap() as usize, EXTRANONCE_PLACEHOLDER_LEN);
/// ```
pub fn build_script_sig(
    height: u64,
    aux_flags: &[u8],
    timestamp: u32,
    pool_tag: &str,
) -> Result<ScriptSigParts, TemplateError> {
    let mut prefix = serialize_number(height);
    prefix.extend_from_slice(aux_flags);
    prefix.extend_from_slice(&serialize_number(timestamp as u64));
    prefix.push(EXTRANONCE_PLACEHOLDER_LEN as u8);

    let parts = ScriptSigParts {
        prefix,
        suffix: serialize_string(pool_tag.as_bytes()),
    };

    if parts.script_len() > MAX_COINBASE_SCRIPT_SIZE {
        return Err(TemplateError::malformed(
            "coinbaseaux.flags",
            format!(
                "coinbase scriptSig would be {} bytes (max {})",
                parts.script_len(),
                MAX_COINBASE_SCRIPT_SIZE
            ),
        ));
    }

    Ok(parts)
}

/// Read the BIP34 height from the front of a coinbase scriptSig.
pub fn extract_height(script_sig: &[u8]) -> Option<u64> {
    deserialize_number(script_sig).map(|(height, _)| height)
}
