//! Filter and sort key sanitization.
//!
//! Filter and sort keys arrive straight from the request and end up as
//! column names in a downstream query builder. Keys that fail the active
//! policy are dropped without feedback; the caller only ever sees the
//! surviving entries.
//!
//! Two policies exist and are kept separate:
//! - [`KeyPolicy::Identifier`] is used by the search page: the key must look
//!   like a plain identifier and a filter value must be non-empty.
//! - [`KeyPolicy::Whitelist`] is used by the export page: the key must be a
//!   field the schema declares filterable (or sortable).
//!
//! # Example
//! ```rust
//! use admin_export_core::models::FilterMap;
//! use admin_export_core::sanitize::{KeyPolicy, sanitize_filters};
//!
//! let mut raw = FilterMap::new();
//! raw.insert("1bad".to_string(), "x".to_string());
//! raw.insert("good_1".to_string(), "y".to_string());
//!
//! let clean = sanitize_filters(&raw, &KeyPolicy::Identifier);
//! assert_eq!(clean.len(), 1);
//! assert_eq!(clean.get("good_1").map(String::as_str), Some("y"));
//! ```

use crate::models::{FilterMap, SortMap};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Pattern a key must match under the identifier policy
pub const IDENTIFIER_PATTERN: &str = "^[A-Za-z0-9_]+$";

static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();

fn identifier_regex() -> &'static Regex {
    IDENTIFIER_REGEX.get_or_init(|| {
        // The pattern is a compile-time constant; failure here is a programming error.
        #[allow(clippy::expect_used)]
        Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is valid")
    })
}

/// Returns true if `key` is a plain identifier (`^[A-Za-z0-9_]+$`).
pub fn is_identifier(key: &str) -> bool {
    identifier_regex().is_match(key)
}

/// Validation policy for filter and sort keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Key must match [`IDENTIFIER_PATTERN`]; filter values must be non-empty
    Identifier,
    /// Key must be a member of the schema-declared set
    Whitelist(HashSet<String>),
}

impl KeyPolicy {
    /// Builds a whitelist policy from a list of field names.
    pub fn whitelist<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyPolicy::Whitelist(names.into_iter().map(Into::into).collect())
    }

    /// Checks a key against this policy.
    pub fn allows_key(&self, key: &str) -> bool {
        match self {
            KeyPolicy::Identifier => is_identifier(key),
            KeyPolicy::Whitelist(names) => names.contains(key),
        }
    }

    fn allows_filter(&self, key: &str, value: &str) -> bool {
        match self {
            KeyPolicy::Identifier => !value.is_empty() && is_identifier(key),
            KeyPolicy::Whitelist(_) => self.allows_key(key),
        }
    }
}

/// Returns the filter entries accepted by `policy`, in their original order.
///
/// Rejected entries are logged at debug level and otherwise dropped.
pub fn sanitize_filters(raw: &FilterMap, policy: &KeyPolicy) -> FilterMap {
    raw.iter()
        .filter(|(key, value)| {
            let keep = policy.allows_filter(key, value);
            if !keep {
                tracing::debug!(key = %key, "Dropping filter key");
            }
            keep
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Returns the sort entries whose key is accepted by `policy`.
///
/// Directions are passed through untouched; only the key reaches the
/// query as an identifier.
pub fn sanitize_sort(raw: &SortMap, policy: &KeyPolicy) -> SortMap {
    raw.iter()
        .filter(|(key, _)| {
            let keep = policy.allows_key(key);
            if !keep {
                tracing::debug!(key = %key, "Dropping sort key");
            }
            keep
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn map(entries: &[(&str, &str)]) -> FilterMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_identifier_policy_filters() {
        let raw = map(&[
            ("1bad", "x"),
            ("good_1", "y"),
            ("profile name", "z"),
            ("empty", ""),
            ("drop;table", "w"),
        ]);

        let clean = sanitize_filters(&raw, &KeyPolicy::Identifier);

        // a leading digit is still inside the character class
        assert_eq!(clean, map(&[("1bad", "x"), ("good_1", "y")]));
    }

    #[test]
    fn test_identifier_policy_sort_ignores_direction() {
        let raw = map(&[("profile_name", ""), ("profile-id", "ASC"), ("created", "sideways")]);
        let clean = sanitize_sort(&raw, &KeyPolicy::Identifier);
        assert_eq!(clean, map(&[("profile_name", ""), ("created", "sideways")]));
    }

    #[test]
    fn test_whitelist_policy_allows_empty_values() {
        let policy = KeyPolicy::whitelist(["profile_name", "profile_active"]);
        let raw = map(&[
            ("profile_name", ""),
            ("profile_active", "1"),
            ("profile_secret", "x"),
            ("good_1", "y"),
        ]);

        let clean = sanitize_filters(&raw, &policy);
        assert_eq!(clean, map(&[("profile_name", ""), ("profile_active", "1")]));
    }

    #[test]
    fn test_whitelist_policy_sort() {
        let policy = KeyPolicy::whitelist(["profile_created"]);
        let raw = map(&[("profile_created", "DESC"), ("profile_id", "ASC")]);
        assert_eq!(
            sanitize_sort(&raw, &policy),
            map(&[("profile_created", "DESC")])
        );
    }

    #[test]
    fn test_empty_input() {
        let raw = FilterMap::new();
        assert!(sanitize_filters(&raw, &KeyPolicy::Identifier).is_empty());
        assert!(sanitize_sort(&raw, &KeyPolicy::whitelist(Vec::<String>::new())).is_empty());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("good_1"));
        assert!(is_identifier("1bad"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier("naïve"));
        assert!(!is_identifier("x\n"));
    }

    fn raw_entries() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("[A-Za-z0-9_ .;-]{0,8}", "[a-z]{0,3}"), 0..12)
    }

    proptest! {
        #[test]
        fn prop_whitelist_keys_are_subset(entries in raw_entries(), allowed in prop::collection::hash_set("[a-z_]{1,4}", 0..6)) {
            let raw: FilterMap = entries.into_iter().collect();
            let policy = KeyPolicy::Whitelist(allowed.clone());
            let clean = sanitize_filters(&raw, &policy);

            for (key, value) in &clean {
                prop_assert!(allowed.contains(key));
                prop_assert_eq!(raw.get(key), Some(value));
            }
            for (key, _) in &raw {
                prop_assert_eq!(clean.contains_key(key), allowed.contains(key));
            }
        }

        #[test]
        fn prop_identifier_retention(entries in raw_entries()) {
            let raw: FilterMap = entries.into_iter().collect();
            let clean = sanitize_filters(&raw, &KeyPolicy::Identifier);

            for (key, value) in &raw {
                let expected = !value.is_empty()
                    && !key.is_empty()
                    && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                prop_assert_eq!(clean.contains_key(key), expected);
            }
        }
    }
}
