//! Cache key derivation
//!
//! A key is the lowercase hex SHA-256 of the canonical text `"{min}_{max}"`.
//! Bounds are rendered in shortest round-trip decimal form, so `5.0` and `5`
//! produce the same text while any two distinct values never do.

use quake_core::{QueryParameters, Result};
use sha2::{Digest, Sha256};

/// Length of a key in hex characters
pub const KEY_LEN: usize = 64;

/// Fixed-length opaque cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a validated parameter set
    pub fn from_params(params: &QueryParameters) -> Self {
        Self::hash(&canonical_form(params))
    }

    /// Derive the key from raw bounds, rejecting non-finite values
    pub fn from_bounds(min_magnitude: f64, max_magnitude: f64) -> Result<Self> {
        let params = QueryParameters::new(min_magnitude, max_magnitude)?;
        Ok(Self::from_params(&params))
    }

    fn hash(canonical: &str) -> Self {
        let digest = Sha256::digest(canonical.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key as stored in a shared namespace, e.g. `quake:3fa1...`
    pub fn namespaced(&self, prefix: &str) -> String {
        if prefix.is_empty() {
            self.0.clone()
        } else {
            format!("{}:{}", prefix, self.0)
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonical text for a parameter set
pub fn canonical_form(params: &QueryParameters) -> String {
    format!(
        "{}_{}",
        canonical_number(params.min_magnitude()),
        canonical_number(params.max_magnitude())
    )
}

fn canonical_number(value: f64) -> String {
    // -0.0 == 0.0, keep them on one key
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{}", value)
}

/// Shorthand for [`CacheKey::from_params`]
pub fn fingerprint(params: &QueryParameters) -> CacheKey {
    CacheKey::from_params(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quake_core::QuakeError;

    fn params(min: f64, max: f64) -> QueryParameters {
        QueryParameters::new(min, max).unwrap()
    }

    #[test]
    fn test_deterministic() {
        let key1 = fingerprint(&params(1.0, 5.0));
        let key2 = fingerprint(&params(1.0, 5.0));
        assert_eq!(key1, key2);
        assert_eq!(key1.as_str().len(), KEY_LEN);
    }

    #[test]
    fn test_sensitive_to_each_bound() {
        let base = fingerprint(&params(1.0, 5.0));
        assert_ne!(base, fingerprint(&params(1.5, 5.0)));
        assert_ne!(base, fingerprint(&params(1.0, 5.5)));
        assert_ne!(base, fingerprint(&params(5.0, 1.0)));
    }

    #[test]
    fn test_canonical_formatting() {
        assert_eq!(canonical_form(&params(5.0, 6.25)), "5_6.25");
        assert_eq!(canonical_form(&params(-0.0, 1.0)), "0_1");
        assert_eq!(
            fingerprint(&params(-0.0, 1.0)),
            fingerprint(&params(0.0, 1.0))
        );
        let parsed = QueryParameters::parse("5", "7.50").unwrap();
        assert_eq!(fingerprint(&parsed), fingerprint(&params(5.0, 7.5)));
    }

    #[test]
    fn test_known_digest() {
        // sha256("1_5")
        let key = fingerprint(&params(1.0, 5.0));
        let expected = hex::encode(Sha256::digest(b"1_5"));
        assert_eq!(key.as_str(), expected);
        assert!(key.as_str().chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_from_bounds_rejects_non_finite() {
        assert!(matches!(
            CacheKey::from_bounds(f64::NAN, 1.0),
            Err(QuakeError::InvalidParameter(_))
        ));
        assert!(CacheKey::from_bounds(1.0, 2.0).is_ok());
    }

    #[test]
    fn test_namespaced() {
        let key = fingerprint(&params(2.0, 6.0));
        assert_eq!(key.namespaced("quake"), format!("quake:{}", key));
        assert_eq!(key.namespaced(""), key.to_string());
    }
}
