//! Product code generation: `PREFIX-<base36 millis>-<6 random base36>`.
//!
//! No existence check is made; uniqueness rests on the time component plus
//! 36^6 random suffixes per millisecond.

use rand::Rng;
use time::OffsetDateTime;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 6;

fn base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let idx = usize::try_from(n % 36).unwrap_or_default();
        digits.push(ALPHABET[idx]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Generate a fresh upper-case product code at `now`.
#[must_use]
pub fn generate_code(prefix: &str, now: OffsetDateTime) -> String {
    let millis = u128::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or_default();
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect();
    format!("{}-{}-{}", prefix.trim(), base36(millis), suffix).to_uppercase()
}
