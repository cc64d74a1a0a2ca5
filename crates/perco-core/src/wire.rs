//! Perco stream codec — length-prefixed and varint primitives.
//!
//! Every request field that crosses the network is written through these
//! functions, in a fixed order defined by the request type. There is no
//! version tag: changing field order or presence encoding is a breaking
//! change to the wire format.
//!
//! All functions operate on `bytes::Buf`/`BufMut` so they work equally
//! against a `BytesMut` being assembled for send and a `Bytes` view of a
//! receive buffer. A decode either fully succeeds or fails with a
//! [`WireError`] — there is no partial-decode recovery.

use bytes::{Buf, BufMut, Bytes};

// ── Varint ───────────────────────────────────────────────────────────────────

/// Write an unsigned 64-bit integer as a varint: 7 payload bits per byte,
/// high bit set on every byte except the last. At most 10 bytes.
pub fn put_vlong(buf: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Read a varint written by [`put_vlong`].
pub fn get_vlong(buf: &mut impl Buf) -> Result<u64, WireError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        if !buf.has_remaining() {
            return Err(WireError::Truncated);
        }
        if shift > 63 {
            return Err(WireError::VarintOverflow);
        }
        let byte = buf.get_u8();
        // Tenth byte: only bit 63 is left, so any payload above 0x01 would
        // be silently dropped by the shift. Reject instead.
        if shift == 63 && byte & 0x7f > 0x01 {
            return Err(WireError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

// ── Strings ──────────────────────────────────────────────────────────────────

/// Write a string as a varint byte length followed by UTF-8 bytes.
pub fn put_string(buf: &mut impl BufMut, value: &str) {
    put_vlong(buf, value.len() as u64);
    buf.put_slice(value.as_bytes());
}

/// Read a string written by [`put_string`].
pub fn get_string(buf: &mut impl Buf) -> Result<String, WireError> {
    let bytes = get_bytes(buf)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8)
}

/// Write an optional string: one presence byte (0x00 absent, 0x01 present),
/// then the string itself when present. Absence is one byte on the wire —
/// an unset field never turns into an empty string on the far side.
pub fn put_opt_string(buf: &mut impl BufMut, value: Option<&str>) {
    match value {
        Some(s) => {
            buf.put_u8(0x01);
            put_string(buf, s);
        }
        None => buf.put_u8(0x00),
    }
}

/// Read an optional string written by [`put_opt_string`].
pub fn get_opt_string(buf: &mut impl Buf) -> Result<Option<String>, WireError> {
    if !buf.has_remaining() {
        return Err(WireError::Truncated);
    }
    match buf.get_u8() {
        0x00 => Ok(None),
        0x01 => Ok(Some(get_string(buf)?)),
        other => Err(WireError::InvalidPresenceFlag(other)),
    }
}

// ── Byte ranges ──────────────────────────────────────────────────────────────

/// Write a byte range as a varint length followed by the raw bytes.
pub fn put_bytes(buf: &mut impl BufMut, value: &[u8]) {
    put_vlong(buf, value.len() as u64);
    buf.put_slice(value);
}

/// Read a byte range written by [`put_bytes`]. The returned `Bytes` is a
/// view of the receive buffer, which the decoding side exclusively owns.
pub fn get_bytes(buf: &mut impl Buf) -> Result<Bytes, WireError> {
    let len = get_vlong(buf)? as usize;
    if buf.remaining() < len {
        return Err(WireError::Truncated);
    }
    Ok(buf.copy_to_bytes(len))
}

// ── String arrays ────────────────────────────────────────────────────────────

/// Write a string array as a varint count followed by each string.
pub fn put_string_array(buf: &mut impl BufMut, values: &[String]) {
    put_vlong(buf, values.len() as u64);
    for value in values {
        put_string(buf, value);
    }
}

/// Read a string array written by [`put_string_array`].
pub fn get_string_array(buf: &mut impl Buf) -> Result<Vec<String>, WireError> {
    let count = get_vlong(buf)? as usize;
    // A count beyond the remaining byte count is malformed — each entry
    // costs at least one length byte.
    if count > buf.remaining() {
        return Err(WireError::Truncated);
    }
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(get_string(buf)?);
    }
    Ok(values)
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Errors that can arise when decoding wire-format data, plus the two
/// cases where a request cannot be encoded at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("input truncated")]
    Truncated,

    #[error("varint exceeds 64 bits")]
    VarintOverflow,

    #[error("invalid utf-8 in string field")]
    InvalidUtf8,

    #[error("invalid presence flag: 0x{0:02x}")]
    InvalidPresenceFlag(u8),

    #[error("cannot encode request: {0} is not set")]
    MissingField(&'static str),
}

// ── Tests ────────────────────────────────────────────────────────────────────
