pub mod url_validator;

use subtle::ConstantTimeEq;

/// Random part of a key id. 62^12 ≈ 2^71.
pub const KEY_RANDOM_LENGTH: usize = 12;

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    // 随机选择字母和数字
    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// Generate a key id: base-36 millisecond timestamp followed by a random
/// alphanumeric suffix. Only `[0-9A-Za-z]`, so it never needs escaping.
pub fn generate_key_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut id = to_base36(millis);
    id.push_str(&generate_random_code(KEY_RANDOM_LENGTH));
    id
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(13);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

/// Compare two secrets without leaking the position of the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
