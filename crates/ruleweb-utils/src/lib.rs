//! Utility functions and helpers

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Case-insensitive substring test. An empty needle always matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Join display tokens with single spaces
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique ID with the given prefix
pub fn generate_id(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{:x}-{}", prefix, millis, seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case(" payee is Acme", "ACME"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("payee is Acme", "food"));
    }

    #[test]
    fn test_join_tokens() {
        assert_eq!(join_tokens(&["set", "category", "to", "Food"]), "set category to Food");
        assert_eq!(join_tokens::<&str>(&[]), "");
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id("rule");
        let b = generate_id("rule");
        assert!(a.starts_with("rule-"));
        assert_ne!(a, b);
    }
}
