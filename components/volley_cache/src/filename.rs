//! Cache key → filename mapping (§4.4).
//!
//! The filename is `hash(first_half_of_key)` concatenated with `hash(second_half_of_key)`,
//! rendered as decimal. Collisions are tolerated: the on-disk header carries the full
//! key, so a collision just looks like corruption (wrong key inside) and the entry is
//! dropped and pruned naturally.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Derive the on-disk filename for a cache key.
pub fn filename_for_key(key: &str) -> String {
    let mid = key.len() / 2;
    // split at a char boundary at or before the midpoint so multi-byte keys don't panic
    let mut split = mid;
    while split > 0 && !key.is_char_boundary(split) {
        split -= 1;
    }
    let (first, second) = key.split_at(split);
    format!("{}{}", hash_str(first), hash_str(second))
}
