//! LEB128 variable-length integers.
//!
//! Every byte carries seven value bits, least significant group first. The high bit
//! is set on every byte except the last.
//!
//! See <https://webassembly.github.io/spec/core/binary/values.html#integers>

use alloc::vec::Vec;

use crate::{EncodeError, Result};

const CONTINUATION: u8 = 0x80;
const LOW_BITS: u8 = 0x7F;

/// Encode `value` as a minimal unsigned LEB128 sequence
pub fn encode_unsigned(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(unsigned_len(value));
    write_unsigned(&mut buf, value);
    buf
}

/// Like [`encode_unsigned`], but for callers holding a signed integer
///
/// Fails with [`EncodeError::NegativeValue`] for anything below zero.
pub fn checked_unsigned(value: i64) -> Result<Vec<u8>> {
    let value = u64::try_from(value).map_err(|_| EncodeError::NegativeValue(value))?;
    Ok(encode_unsigned(value))
}

/// Append `value` to `buf` as unsigned LEB128
pub fn write_unsigned(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value as u8) & LOW_BITS;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | CONTINUATION);
    }
}

/// Append `value` to `buf` as signed LEB128
///
/// Used by the `i32.const` and `i64.const` immediates.
pub fn write_signed(buf: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value as u8) & LOW_BITS;
        // arithmetic shift keeps the sign
        value >>= 7;

        let sign_bit_clear = byte & 0x40 == 0;
        let done = (value == 0 && sign_bit_clear) || (value == -1 && !sign_bit_clear);
        if done {
            buf.push(byte);
            return;
        }
        buf.push(byte | CONTINUATION);
    }
}

/// Append a vector length, count or byte size
///
/// The binary format caps these at `u32::MAX`.
pub fn write_len(buf: &mut Vec<u8>, len: usize, what: &'static str) -> Result<()> {
    let len32 = u32::try_from(len).map_err(|_| EncodeError::LengthOverflow { what, len })?;
    write_unsigned(buf, u64::from(len32));
    Ok(())
}

/// Append a UTF-8 name as `len ++ bytes`
pub fn write_name(buf: &mut Vec<u8>, name: &str) -> Result<()> {
    write_len(buf, name.len(), "name")?;
    buf.extend_from_slice(name.as_bytes());
    Ok(())
}

/// Number of bytes [`write_unsigned`] produces for `value`
pub fn unsigned_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}
