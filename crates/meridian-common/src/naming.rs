//! Deterministic resource naming under length ceilings
//!
//! Cloud and Kubernetes identifiers have hard length limits. Names are built
//! from readable parts and, when too long, truncated with a short hash of the
//! full untruncated name appended. Two long names that share a prefix stay
//! distinct, and the same input always produces the same output.
//!
//! Stricter ceilings are applied by chaining: the output for one ceiling is
//! the input for the next (`truncate_hash_name(truncate_hash_name(n, 100), 30)`).

use std::fmt::Write;

/// Kubernetes object name ceiling
pub const MAX_K8S_NAME_LENGTH: usize = 250;

/// GCP service account display name ceiling
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;

/// GCP service account id ceiling
pub const MAX_GCP_NAME_LENGTH: usize = 30;

/// Number of hex characters appended by [`truncate_hash_name`]
pub const TRUNCATED_HASH_LENGTH: usize = 6;

/// Compute a deterministic hash of the input string, returning a 16-char hex digest.
///
/// Uses truncated SHA-256 so the value is stable across toolchains and can
/// be persisted in object names.
pub fn deterministic_hash(input: &str) -> String {
    use aws_lc_rs::digest;
    let hash = digest::digest(&digest::SHA256, input.as_bytes());
    hash.as_ref()[..8]
        .iter()
        .fold(String::with_capacity(16), |mut s, b| {
            let _ = write!(s, "{:02x}", b);
            s
        })
}

/// Truncate `name` to at most `max_len` bytes, appending a hash of the
/// original when truncation happens.
///
/// Names that already fit are returned unchanged, which makes repeated
/// application with the same ceiling a no-op.
pub fn truncate_hash_name(name: &str, max_len: usize) -> String {
    if name.len() <= max_len {
        return name.to_string();
    }

    let hash = &deterministic_hash(name)[..TRUNCATED_HASH_LENGTH];
    if max_len <= TRUNCATED_HASH_LENGTH + 1 {
        return hash[..max_len.min(hash.len())].to_string();
    }

    let keep = floor_char_boundary(name, max_len - TRUNCATED_HASH_LENGTH - 1);
    format!("{}-{}", &name[..keep], hash)
}

/// Truncate to at most `max_len` bytes without any hash suffix.
pub fn truncate(name: &str, max_len: usize) -> &str {
    &name[..floor_char_boundary(name, max_len)]
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index)
        .rev()
        .find(|i| s.is_char_boundary(*i))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_unchanged() {
        assert_eq!(truncate_hash_name("mrd-prod-checkout", 30), "mrd-prod-checkout");
    }

    #[test]
    fn test_long_name_truncated_to_ceiling() {
        let name = "mrd-production-cluster-payments-checkout-service";
        let out = truncate_hash_name(name, MAX_GCP_NAME_LENGTH);
        assert_eq!(out.len(), MAX_GCP_NAME_LENGTH);
        assert!(out.starts_with("mrd-production-cluster-"));
        assert_eq!(&out[23..24], "-");
    }

    #[test]
    fn test_deterministic() {
        let name = "a".repeat(300);
        assert_eq!(
            truncate_hash_name(&name, MAX_K8S_NAME_LENGTH),
            truncate_hash_name(&name, MAX_K8S_NAME_LENGTH)
        );
        assert_eq!(deterministic_hash("x"), deterministic_hash("x"));
        assert_eq!(deterministic_hash("x").len(), 16);
    }

    /// Names sharing the kept prefix still come out different
    #[test]
    fn test_shared_prefix_distinguished() {
        let a = format!("{}-alpha", "shared-prefix".repeat(10));
        let b = format!("{}-bravo", "shared-prefix".repeat(10));
        let ta = truncate_hash_name(&a, 40);
        let tb = truncate_hash_name(&b, 40);
        assert_eq!(ta[..33], tb[..33]);
        assert_ne!(ta, tb);
    }

    #[test]
    fn test_idempotent_for_same_ceiling() {
        let name = "n".repeat(120);
        let once = truncate_hash_name(&name, MAX_DISPLAY_NAME_LENGTH);
        let twice = truncate_hash_name(&once, MAX_DISPLAY_NAME_LENGTH);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_chained_ceilings() {
        let name = format!("mrd-{}-{}-{}", "cluster".repeat(5), "ns".repeat(20), "svc".repeat(20));
        let display = truncate_hash_name(&name, MAX_DISPLAY_NAME_LENGTH);
        let short = truncate_hash_name(&display, MAX_GCP_NAME_LENGTH);
        assert_eq!(display.len(), MAX_DISPLAY_NAME_LENGTH);
        assert_eq!(short.len(), MAX_GCP_NAME_LENGTH);
        // the short name hashes the display name, not the original
        assert!(short.ends_with(&deterministic_hash(&display)[..TRUNCATED_HASH_LENGTH]));
    }

    #[test]
    fn test_tiny_ceiling_returns_hash_only() {
        let out = truncate_hash_name("abcdefghijklmnop", 4);
        assert_eq!(out.len(), 4);
        assert_eq!(out, deterministic_hash("abcdefghijklmnop")[..4]);
    }

    #[test]
    fn test_multibyte_names_cut_on_char_boundary() {
        let name = "é".repeat(40);
        let out = truncate_hash_name(&name, 30);
        assert!(out.len() <= 30);
        assert!(out.is_char_boundary(out.len() - TRUNCATED_HASH_LENGTH - 1));
    }

    #[test]
    fn test_plain_truncate() {
        assert_eq!(truncate("checkout", 4), "chec");
        assert_eq!(truncate("api", 20), "api");
    }
}
