//! Unique identifiers for test isolation.

use ulid::Ulid;

/// `{prefix}-{ulid}`
///
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let a = unique_str("p");
/// let b = unique_str("p");
/// assert_ne!(a, b);
/// assert!(a.starts_with("p-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// A fresh participant identity.
pub fn unique_participant(name: &str) -> String {
    unique_str(&format!("participant-{name}"))
}

/// `n` fresh participant identities, `participant-0-...` onwards.
pub fn unique_participants(n: usize) -> Vec<String> {
    (0..n).map(|i| unique_participant(&i.to_string())).collect()
}
