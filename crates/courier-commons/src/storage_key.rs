//! Order-preserving key encoding primitives.
//!
//! Ordered key-value engines compare keys byte by byte, so composite keys
//! must be encoded such that byte order equals logical order:
//!
//! - strings are written verbatim and terminated with a NUL byte (identifier
//!   types forbid embedded NULs), so `"a"` sorts before `"ab"` and prefixes
//!   stay aligned with logical grouping;
//! - unsigned integers are written big-endian;
//! - signed integers are written big-endian with the sign bit flipped, so
//!   negative values sort before positive ones.

/// Appends a string component followed by the NUL terminator.
pub fn push_str(buf: &mut Vec<u8>, s: &str) {
    debug_assert!(!s.as_bytes().contains(&0), "key component contains NUL");
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

/// Appends a `u16` component in big-endian order.
pub fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Appends an `i32` component, order-preserving.
pub fn push_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&((v as u32) ^ (1 << 31)).to_be_bytes());
}

/// Appends an `i64` component, order-preserving.
pub fn push_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&((v as u64) ^ (1 << 63)).to_be_bytes());
}

/// Reads a NUL-terminated string component, returning the string and the
/// remaining bytes.
pub fn take_str(bytes: &[u8]) -> Option<(String, &[u8])> {
    let end = bytes.iter().position(|&b| b == 0)?;
    let s = String::from_utf8(bytes[..end].to_vec()).ok()?;
    Some((s, &bytes[end + 1..]))
}

/// Reads a big-endian `u16` component.
pub fn take_u16(bytes: &[u8]) -> Option<(u16, &[u8])> {
    let (head, rest) = split_array::<2>(bytes)?;
    Some((u16::from_be_bytes(head), rest))
}

/// Reads an order-preserving `i32` component.
pub fn take_i32(bytes: &[u8]) -> Option<(i32, &[u8])> {
    let (head, rest) = split_array::<4>(bytes)?;
    Some(((u32::from_be_bytes(head) ^ (1 << 31)) as i32, rest))
}

/// Reads an order-preserving `i64` component.
pub fn take_i64(bytes: &[u8]) -> Option<(i64, &[u8])> {
    let (head, rest) = split_array::<8>(bytes)?;
    Some(((u64::from_be_bytes(head) ^ (1 << 63)) as i64, rest))
}

fn split_array<const N: usize>(bytes: &[u8]) -> Option<([u8; N], &[u8])> {
    if bytes.len() < N {
        return None;
    }
    let mut head = [0u8; N];
    head.copy_from_slice(&bytes[..N]);
    Some((head, &bytes[N..]))
}
