//! Primitive wire encodings.
//!
//! Everything the coinbase and block serializers write goes through the
//! helpers in this module: fixed-width integers, the Bitcoin variable-length
//! integer, CScript number pushes and length-prefixed byte strings.
//!
//! ## Variable-length integer
//!
//! ```text
//! n < 0xfd          [n]
//! n <= 0xffff       [0xfd] [u16 LE]
//! n <= 0xffffffff   [0xfe] [u32 LE]
//! otherwise         [0xff] [u64 LE]
//! ```

/// Pack an unsigned 16-bit integer, little-endian.
pub fn pack_uint16_le(n: u16) -> [u8; 2] {
    n.to_le_bytes()
}

/// Pack a signed 32-bit integer, little-endian two's complement.
pub fn pack_int32_le(n: i32) -> [u8; 4] {
    n.to_le_bytes()
}

/// Pack a signed 32-bit integer, big-endian two's complement.
pub fn pack_int32_be(n: i32) -> [u8; 4] {
    n.to_be_bytes()
}

/// Pack an unsigned 32-bit integer, little-endian.
pub fn pack_uint32_le(n: u32) -> [u8; 4] {
    n.to_le_bytes()
}

/// Pack an unsigned 32-bit integer, big-endian.
pub fn pack_uint32_be(n: u32) -> [u8; 4] {
    n.to_be_bytes()
}

/// Pack a 64-bit amount as two little-endian 32-bit halves (low word first).
///
/// # Examples
///
/// ```
/// use rtm_template::codec::pack_int64_le;
///
/// assert_eq!(pack_int64_le(5_000_000_000), [0x00, 0xf2, 0x05, 0x2a, 0x01, 0, 0, 0]);
/// ```
pub fn pack_int64_le(n: u64) -> [u8; 8] {
    let low = (n % (1u64 << 32)) as u32;
    let high = (n >> 32) as u32;

    let mut buf = [0u8; 8];
    buf[..4].copy_from_slice(&low.to_le_bytes());
    buf[4..].copy_from_slice(&high.to_le_bytes());
    buf
}

/// Encode `n` as a Bitcoin variable-length integer.
///
/// # Examples
///
/// ```
/// use rtm_template::codec::var_int;
///
/// assert_eq!(var_int(0xfc), vec![0xfc]);
/// assert_eq!(var_int(0xfd), vec![0xfd, 0xfd, 0x00]);
/// ```
pub fn var_int(n: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(var_int_size(n));
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
    buf
}

/// Size in bytes of the variable-length integer encoding of `n`.
pub fn var_int_size(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Decode a variable-length integer from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` if `bytes`
/// is too short.
pub fn read_var_int(bytes: &[u8]) -> Option<(u64, usize)> {
    let (&marker, rest) = bytes.split_first()?;
    let width = match marker {
        0xfd => 2,
        0xfe => 4,
        0xff => 8,
        n => return Some((n as u64, 1)),
    };
    let data = rest.get(..width)?;
    let mut le = [0u8; 8];
    le[..width].copy_from_slice(data);
    Some((u64::from_le_bytes(le), 1 + width))
}

/// Serialize a non-negative integer as a CScript number push.
///
/// Values `1..=16` become the single opcode `OP_1..OP_16` (`0x50 + n`). Every
/// other value, zero included, is a length byte followed by the minimal
/// little-endian encoding with the top bit of the last byte kept clear, as
/// BIP34 requires for the block height.
///
/// # Examples
///
/// ```
/// use rtm_template::codec::serialize_number;
///
/// assert_eq!(serialize_number(16), vec![0x60]);
/// assert_eq!(serialize_number(0), vec![0x01, 0x00]);
/// assert_eq!(serialize_number(128), vec![0x02, 0x80, 0x00]);
/// ```
pub fn serialize_number(mut n: u64) -> Vec<u8> {
    if (1..=16).contains(&n) {
        return vec![0x50 + n as u8];
    }

    let mut buf = vec![0u8];
    while n > 0x7f {
        buf.push((n & 0xff) as u8);
        n >>= 8;
    }
    buf.push(n as u8);
    buf[0] = (buf.len() - 1) as u8;
    buf
}

/// Decode a number written by [`serialize_number`] from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed. Negative encodings and
/// values wider than 64 bits are rejected.
pub fn deserialize_number(bytes: &[u8]) -> Option<(u64, usize)> {
    let first = *bytes.first()?;
    if (0x51..=0x60).contains(&first) {
        return Some(((first - 0x50) as u64, 1));
    }

    let len = first as usize;
    if len == 0 || len > 9 {
        return None;
    }
    let data = bytes.get(1..1 + len)?;
    if data[len - 1] & 0x80 != 0 {
        return None;
    }

    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i >= 8 {
            if byte != 0 {
                return None;
            }
            continue;
        }
        value |= (byte as u64) << (i * 8);
    }
    Some((value, 1 + len))
}

/// Length-prefix a byte string with a variable-length integer.
pub fn serialize_string(s: &[u8]) -> Vec<u8> {
    let mut buf = var_int(s.len() as u64);
    buf.extend_from_slice(s);
    buf
}

/// Reverse the byte order of `buf`.
///
/// Converts between the display order the node uses for hashes and the
/// internal order they take inside serialized structures.
pub fn reverse_bytes(buf: &[u8]) -> Vec<u8> {
    buf.iter().rev().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_var_int_boundaries() {
        let cases: [(u64, usize); 7] = [
            (0, 1),
            (0xfc, 1),
            (0xfd, 3),
            (0xffff, 3),
            (0x1_0000, 5),
            (0xffff_ffff, 5),
            (0x1_0000_0000, 9),
        ];
        for (n, size) in cases {
            let encoded = var_int(n);
            assert_eq!(encoded.len(), size, "size for {:#x}", n);
            assert_eq!(var_int_size(n), size);
            assert_eq!(read_var_int(&encoded), Some((n, size)), "round trip {:#x}", n);
        }
    }

    #[test]
    fn test_var_int_wide_branch_is_eight_bytes() {
        let encoded = var_int(0x0102_0304_0506_0708);
        assert_eq!(
            encoded,
            vec![0xff, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_read_var_int_truncated() {
        assert_eq!(read_var_int(&[]), None);
        assert_eq!(read_var_int(&[0xfd, 0x01]), None);
        assert_eq!(read_var_int(&[0xff, 0, 0, 0, 0]), None);
    }

    #[quickcheck]
    fn prop_var_int_round_trip(n: u64) -> bool {
        let encoded = var_int(n);
        read_var_int(&encoded) == Some((n, encoded.len()))
    }

    #[test]
    fn test_serialize_number_small_opcodes() {
        for n in 1..=16u64 {
            let encoded = serialize_number(n);
            assert_eq!(encoded, vec![0x50 + n as u8]);
            assert_eq!(deserialize_number(&encoded), Some((n, 1)));
        }
    }

    #[test]
    fn test_serialize_number_zero_and_seventeen() {
        assert_eq!(serialize_number(0), vec![0x01, 0x00]);
        assert_eq!(deserialize_number(&[0x01, 0x00]), Some((0, 2)));

        assert_eq!(serialize_number(17), vec![0x01, 0x11]);
        assert_eq!(deserialize_number(&[0x01, 0x11]), Some((17, 2)));
    }

    #[test]
    fn test_serialize_number_bip34_heights() {
        assert_eq!(serialize_number(127), vec![0x01, 0x7f]);
        assert_eq!(serialize_number(255), vec![0x02, 0xff, 0x00]);
        assert_eq!(serialize_number(256), vec![0x02, 0x00, 0x01]);
        assert_eq!(serialize_number(500_000), vec![0x03, 0x20, 0xa1, 0x07]);
        assert_eq!(serialize_number(840_000), vec![0x03, 0x40, 0xd1, 0x0c]);
    }

    #[test]
    fn test_serialize_number_timestamp() {
        // 1_600_000_000 = 0x5F5E1000
        let encoded = serialize_number(1_600_000_000);
        assert_eq!(encoded, vec![0x04, 0x00, 0x10, 0x5e, 0x5f]);
        assert_eq!(deserialize_number(&encoded), Some((1_600_000_000, 5)));
    }

    #[quickcheck]
    fn prop_serialize_number_round_trip(n: u64) -> bool {
        let encoded = serialize_number(n);
        deserialize_number(&encoded) == Some((n, encoded.len()))
    }

    #[test]
    fn test_deserialize_number_rejects_negative() {
        assert_eq!(deserialize_number(&[0x01, 0x81]), None);
        assert_eq!(deserialize_number(&[0x00]), None);
        assert_eq!(deserialize_number(&[0x03, 0x01]), None);
    }

    #[test]
    fn test_serialize_string() {
        let tag = serialize_string(b"/nodeStratum/");
        assert_eq!(tag[0], 13);
        assert_eq!(&tag[1..], b"/nodeStratum/");

        let long = vec![0x61u8; 300];
        let encoded = serialize_string(&long);
        assert_eq!(&encoded[..3], &[0xfd, 0x2c, 0x01]);
        assert_eq!(encoded.len(), 303);
    }

    #[test]
    fn test_fixed_width_packers() {
        assert_eq!(pack_uint16_le(3), [0x03, 0x00]);
        assert_eq!(pack_int32_le(-1), [0xff; 4]);
        assert_eq!(pack_int32_be(4), [0, 0, 0, 4]);
        assert_eq!(pack_uint32_le(0xffff_ffff), [0xff; 4]);
        assert_eq!(pack_uint32_be(0x5f5e_1000), [0x5f, 0x5e, 0x10, 0x00]);
    }

    #[test]
    fn test_pack_int64_le_beyond_32_bits() {
        let n = 0x0000_0123_4567_89abu64;
        assert_eq!(pack_int64_le(n), n.to_le_bytes());
        assert_eq!(pack_int64_le(u64::MAX), [0xff; 8]);
    }

    #[test]
    fn test_reverse_bytes() {
        assert_eq!(reverse_bytes(&[1, 2, 3]), vec![3, 2, 1]);
        assert!(reverse_bytes(&[]).is_empty());
    }
}
