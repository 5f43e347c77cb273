//! Content-addressed cache keys
//!
//! A key is a blake3 digest of `(source id, normalized indicator, relevant
//! params)` with length framing, so the same lookup always lands on the same
//! entry and no field concatenation can collide across boundaries.

use pivot_core::Indicator;
use std::fmt;

/// Deterministic address of one (source, indicator, params) lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Build the key for a source's lookup of an indicator.
    ///
    /// `params` carries whatever source-specific options affect the result
    /// (already sorted by the caller if order is not meaningful).
    pub fn new(source_id: &str, indicator: &Indicator, params: &[(&str, &str)]) -> Self {
        let mut hasher = blake3::Hasher::new();
        frame(&mut hasher, source_id.as_bytes());
        frame(&mut hasher, indicator.itype.as_str().as_bytes());
        frame(&mut hasher, indicator.value.as_bytes());
        for (name, value) in params {
            frame(&mut hasher, name.as_bytes());
            frame(&mut hasher, value.as_bytes());
        }
        CacheKey(*hasher.finalize().as_bytes())
    }
}

fn frame(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_core::IndicatorType;

    fn ip(value: &str) -> Indicator {
        Indicator::new(IndicatorType::Ip, value).unwrap()
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let a = CacheKey::new("whois", &ip("8.8.8.8"), &[]);
        let b = CacheKey::new("whois", &ip("8.8.8.8"), &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn distinguishes_source_indicator_and_params() {
        let base = CacheKey::new("whois", &ip("8.8.8.8"), &[]);
        assert_ne!(base, CacheKey::new("rdap", &ip("8.8.8.8"), &[]));
        assert_ne!(base, CacheKey::new("whois", &ip("8.8.4.4"), &[]));
        assert_ne!(base, CacheKey::new("whois", &ip("8.8.8.8"), &[("deep", "true")]));
    }

    #[test]
    fn framing_prevents_field_bleed() {
        let ab = CacheKey::new("ab", &ip("8.8.8.8"), &[("c", "d")]);
        let a = CacheKey::new("a", &ip("8.8.8.8"), &[("bc", "d")]);
        assert_ne!(ab, a);
    }
}
