//! Length-prefixed key encoding for LMDB storage.
//!
//! Binding keys are encoded as: [len1][bytes1][len2][bytes2]
//! - No delimiters, no escaping, any bytes allowed
//! - A one-part key is a prefix of every two-part key that starts with the same part,
//!   so `prefix_iter` over `[len][a]` visits exactly the pairs whose first part is `a`
//! - Permission ids are stored as 8 big-endian bytes, so they iterate in ascending order

use crate::error::{AccessError, Result};
use crate::model::PermissionId;

/// Longest part a single length byte can describe
pub const MAX_PART_LEN: usize = u8::MAX as usize;

/// Build a length-prefixed key from raw parts
pub fn build_key(parts: &[&[u8]]) -> Result<Vec<u8>> {
    let total_len: usize = parts.iter().map(|p| 1 + p.len()).sum();
    let mut key = Vec::with_capacity(total_len);
    for part in parts {
        if part.len() > MAX_PART_LEN {
            return Err(AccessError::validation(format!(
                "key part exceeds {} bytes",
                MAX_PART_LEN
            )));
        }
        key.push(part.len() as u8);
        key.extend_from_slice(part);
    }
    Ok(key)
}

/// Get the Nth part from a key without allocating
pub fn get_part(bytes: &[u8], n: usize) -> Option<&[u8]> {
    let mut i = 0;
    let mut count = 0;
    while i < bytes.len() {
        let len = bytes[i] as usize;
        if i + 1 + len > bytes.len() {
            return None;
        }
        if count == n {
            return Some(&bytes[i + 1..i + 1 + len]);
        }
        i += 1 + len;
        count += 1;
    }
    None
}

/// Check a text part (slug, username) before it becomes a key
pub fn text_part<'a>(what: &str, s: &'a str) -> Result<&'a [u8]> {
    if s.is_empty() {
        return Err(AccessError::validation(format!("{} cannot be empty", what)));
    }
    if s.len() > MAX_PART_LEN {
        return Err(AccessError::validation(format!(
            "{} exceeds {} bytes",
            what, MAX_PART_LEN
        )));
    }
    Ok(s.as_bytes())
}

/// Nth part of a key decoded as a permission id
#[inline]
pub fn id_at(bytes: &[u8], n: usize) -> Option<PermissionId> {
    get_part(bytes, n).and_then(PermissionId::from_be_slice)
}

/// Nth part of a key decoded as UTF-8 text
#[inline]
pub fn text_at(bytes: &[u8], n: usize) -> Option<String> {
    get_part(bytes, n).and_then(|b| std::str::from_utf8(b).ok()).map(str::to_string)
}
