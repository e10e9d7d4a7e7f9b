//! Public id generator tests

use std::collections::HashSet;

use wayfarer_shared::{generate_public_id, is_public_id, PUBLIC_ID_LEN};

#[test]
fn test_generated_ids_are_eight_digits() {
    for _ in 0..1000 {
        let id = generate_public_id();
        assert_eq!(id.len(), PUBLIC_ID_LEN, "bad length: {}", id);
        assert!(id.bytes().all(|b| b.is_ascii_digit()), "non-digit in {}", id);
        assert!(is_public_id(&id));
    }
}

#[test]
fn test_generated_ids_are_spread_out() {
    let ids: HashSet<String> = (0..1000).map(|_| generate_public_id()).collect();
    assert!(ids.len() > 990, "only {} distinct ids in 1000 draws", ids.len());
}
