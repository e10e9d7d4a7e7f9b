//! Public profile ids
//!
//! Every profile gets an 8-digit numeric id that is safe to share in links
//! (`/u/04718233`) instead of the internal UUID. Leading zeros are part of
//! the id, so it is always handled as a string.

use rand::Rng;

/// Number of digits in a public id.
pub const PUBLIC_ID_LEN: usize = 8;

const PUBLIC_ID_SPACE: u32 = 100_000_000;

/// Draw a fresh public id. Uniqueness is enforced by the database; callers
/// retry on collision.
pub fn generate_public_id() -> String {
    let n = rand::thread_rng().gen_range(0..PUBLIC_ID_SPACE);
    format!("{:0width$}", n, width = PUBLIC_ID_LEN)
}

/// True if `s` is exactly eight ASCII digits.
pub fn is_public_id(s: &str) -> bool {
    s.len() == PUBLIC_ID_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_leading_zeros() {
        assert!(is_public_id("00000001"));
        assert!(is_public_id("99999999"));
    }

    #[test]
    fn rejects_malformed() {
        assert!(!is_public_id(""));
        assert!(!is_public_id("1234567"));
        assert!(!is_public_id("123456789"));
        assert!(!is_public_id("1234567a"));
        assert!(!is_public_id("１２３４５６７８"));
    }
}
