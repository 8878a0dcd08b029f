//! NX-002: Cache key derivation (BLAKE3 over the normalized package set).

use super::types::{CacheKey, PackageSpec};

/// Hex characters kept from the digest.
pub const KEY_LEN: usize = 16;

const SPEC_DELIMITER: &str = ",";

/// Derive the cache key for a set of specs.
///
/// Normalized forms are sorted and de-duplicated before hashing, so argument
/// order and repeats never change the key.
pub fn derive<'a, I>(packages: I) -> CacheKey
where
    I: IntoIterator<Item = &'a PackageSpec>,
{
    let mut forms: Vec<String> = packages.into_iter().map(PackageSpec::normalized).collect();
    forms.sort();
    forms.dedup();
    let joined = forms.join(SPEC_DELIMITER);
    let hex = blake3::hash(joined.as_bytes()).to_hex();
    CacheKey(hex[..KEY_LEN].to_string())
}
