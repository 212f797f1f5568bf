//! Join codes for sessions.
//!
//! Codes are 10 characters from Crockford's Base32 alphabet, so they can be
//! read aloud and typed without ambiguity.

use rand::Rng;

const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ"; // no I, L, O, U

pub const JOIN_CODE_LEN: usize = 10;

/// Generate a random join code.
///
/// Uniqueness is enforced by the `sessions.code` unique key; callers retry
/// on `JoinCodeConflict`.
pub fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LEN)
        .map(|_| CROCKFORD[rng.random_range(0..CROCKFORD.len())] as char)
        .collect()
}

/// Normalize user input: trim, uppercase, and map the look-alike letters
/// Crockford excludes onto their digits.
pub fn normalize_join_code(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '-')
        .map(|c| match c.to_ascii_uppercase() {
            'O' => '0',
            'I' | 'L' => '1',
            other => other,
        })
        .collect()
}
