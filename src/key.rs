//! Cache Key Module
//!
//! Derives stable, collision-resistant keys from a logical operation name
//! and its arguments.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

// == Cache Key ==
/// An opaque, fixed-length cache key (lowercase hex digest).
///
/// Two logically identical calls always derive the same key; any change to
/// the operation name, a positional argument, or a keyword argument value
/// produces a different key with overwhelming probability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Call Args ==
/// The arguments of one logical call: positional values in call order plus
/// keyword values sorted by name.
///
/// Values are captured in their `Display` form; the BTreeMap makes keyword
/// ordering structural, so insertion order can never leak into the key.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    /// Positional argument renderings, in call order
    positional: Vec<String>,
    /// Keyword argument renderings, sorted by name
    keyword: BTreeMap<String, String>,
}

impl CallArgs {
    // == Constructor ==
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    // == Positional ==
    /// Appends a positional argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.positional.push(value.to_string());
        self
    }

    // == Keyword ==
    /// Adds a keyword argument. Insertion order is irrelevant; a repeated
    /// name overwrites the earlier value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.keyword.insert(name.into(), value.to_string());
        self
    }

    /// Returns true if no arguments have been recorded.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

// == Cache Args Trait ==
/// Implemented by typed argument structs so the decorator can derive a key
/// from them without giving up type safety.
pub trait CacheArgs {
    /// Renders this value as the positional/keyword parts of a call.
    fn call_args(&self) -> CallArgs;
}

impl CacheArgs for CallArgs {
    fn call_args(&self) -> CallArgs {
        self.clone()
    }
}

impl CacheArgs for () {
    fn call_args(&self) -> CallArgs {
        CallArgs::new()
    }
}

// == Derive ==
/// Derives the cache key for one logical call.
///
/// Hashes the operation name, each positional argument in call order, and
/// each keyword argument as `name=value` in lexicographic name order, then
/// returns the hex form of the digest.
///
/// # Arguments
/// * `operation` - Logical operation identifier (typically the function name)
/// * `args` - The call's arguments
pub fn derive(operation: &str, args: &CallArgs) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    for value in &args.positional {
        hasher.update(b":");
        hasher.update(value.as_bytes());
    }
    for (name, value) in &args.keyword {
        hasher.update(b":");
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    CacheKey(hex::encode(hasher.finalize()))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derive_deterministic() {
        let args = CallArgs::new().arg("project-42").kwarg("status", "open");
        let key1 = derive("list_rfis", &args);
        let key2 = derive("list_rfis", &args);
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_derive_fixed_length() {
        let short = derive("op", &CallArgs::new());
        let long = derive(
            "a_much_longer_operation_name",
            &CallArgs::new().arg("x".repeat(500)),
        );
        assert_eq!(short.as_str().len(), 64);
        assert_eq!(long.as_str().len(), 64);
    }

    #[test]
    fn test_derive_kwarg_order_irrelevant() {
        let forward = CallArgs::new().kwarg("a", 1).kwarg("b", 2).kwarg("c", 3);
        let reverse = CallArgs::new().kwarg("c", 3).kwarg("b", 2).kwarg("a", 1);
        assert_eq!(derive("op", &forward), derive("op", &reverse));
    }

    #[test]
    fn test_derive_operation_changes_key() {
        let args = CallArgs::new().arg(7);
        assert_ne!(derive("list_rfis", &args), derive("list_submittals", &args));
    }

    #[test]
    fn test_derive_positional_value_changes_key() {
        assert_ne!(
            derive("op", &CallArgs::new().arg(1)),
            derive("op", &CallArgs::new().arg(2)),
        );
    }

    #[test]
    fn test_derive_kwarg_value_changes_key() {
        assert_ne!(
            derive("op", &CallArgs::new().kwarg("status", "open")),
            derive("op", &CallArgs::new().kwarg("status", "closed")),
        );
    }

    #[test]
    fn test_derive_positional_order_matters() {
        assert_ne!(
            derive("op", &CallArgs::new().arg("a").arg("b")),
            derive("op", &CallArgs::new().arg("b").arg("a")),
        );
    }

    #[test]
    fn test_unit_args_equal_empty_args() {
        assert_eq!(derive("op", &().call_args()), derive("op", &CallArgs::new()));
    }

    proptest! {
        #[test]
        fn prop_derive_invariant_under_kwarg_insertion_order(
            pairs in proptest::collection::vec(("[a-z]{1,8}", "[a-zA-Z0-9]{0,16}"), 1..8)
        ) {
            let forward = pairs.iter().fold(CallArgs::new(), |acc, (name, value)| {
                acc.kwarg(name.clone(), value)
            });
            let reversed = pairs.iter().rev().fold(CallArgs::new(), |acc, (name, value)| {
                acc.kwarg(name.clone(), value)
            });
            // With duplicate names the later insertion wins, so only compare
            // when all names are distinct.
            let mut names: Vec<_> = pairs.iter().map(|(n, _)| n.clone()).collect();
            names.sort();
            names.dedup();
            prop_assume!(names.len() == pairs.len());

            prop_assert_eq!(derive("op", &forward), derive("op", &reversed));
        }

        #[test]
        fn prop_derive_distinguishes_positional_values(
            a in "[a-zA-Z0-9]{1,32}",
            b in "[a-zA-Z0-9]{1,32}",
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(
                derive("op", &CallArgs::new().arg(&a)),
                derive("op", &CallArgs::new().arg(&b))
            );
        }
    }
}
