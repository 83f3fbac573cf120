//! Policy fingerprinting — deterministic identification of a decision policy.
//!
//! Every logged analysis carries the short policy hash so a decision can be
//! tied back to the exact thresholds that produced it.

use crate::domain::PolicyHash;
use crate::policy::PolicyConfig;

impl PolicyConfig {
    /// Hash of the canonical JSON rendering of the policy.
    ///
    /// Struct fields serialize in declaration order, so the JSON is stable for
    /// a given policy.
    pub fn fingerprint(&self) -> PolicyHash {
        match serde_json::to_vec(self) {
            Ok(json) => PolicyHash::from_bytes(&json),
            // Plain structs of numbers and enums cannot fail to serialize; fall
            // back to the debug rendering rather than panicking.
            Err(_) => PolicyHash::from_bytes(format!("{self:?}").as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::policy::{Aggressiveness, PolicyConfig};

    #[test]
    fn hashing_is_deterministic() {
        let config = PolicyConfig::default();
        assert_eq!(config.fingerprint(), config.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_thresholds() {
        let base = PolicyConfig::default();
        let mut tweaked = base.clone();
        tweaked.filters.aggressiveness = Aggressiveness::High;
        assert_ne!(base.fingerprint(), tweaked.fingerprint());

        let mut tweaked = base.clone();
        tweaked.ladder.pip_step = 12.5;
        assert_ne!(base.fingerprint(), tweaked.fingerprint());
    }

    #[test]
    fn fingerprint_survives_toml_roundtrip() {
        let config = PolicyConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = PolicyConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.fingerprint(), parsed.fingerprint());
    }

    #[test]
    fn short_hash_is_prefix() {
        let hash = PolicyConfig::default().fingerprint();
        assert_eq!(hash.short().len(), 12);
        assert!(hash.0.starts_with(hash.short()));
    }
}
