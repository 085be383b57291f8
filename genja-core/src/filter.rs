//! Pattern filter/transform pipeline.
//!
//! Two primitives reshape path lists everywhere in the assemblers:
//!
//! - [`partition`] splits a list into (matched, unmatched) against a
//!   pattern set, preserving input order on both sides.
//! - [`normalize`] rewrites the first occurrence of a pattern in every
//!   element, then deduplicates and sorts. This is how a schema stem
//!   is recovered from the names of its generated siblings.
//!
//! Patterns use match-from-start semantics: a pattern matches only at
//! the beginning of the path, so `third_party` does not match
//! `a/third_party`.

use regex::Regex;

/// One or more start-anchored patterns combined with logical OR.
pub struct Patterns {
    regexes: Vec<Regex>,
}

impl Patterns {
    /// Compile a set of patterns. Patterns are fixed string literals
    /// throughout this crate, so a malformed one is a programming
    /// error.
    pub fn new(patterns: &[&str]) -> Self {
        let regexes = patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("^(?:{p})")).expect("hard-coded filter pattern must compile")
            })
            .collect();
        Self { regexes }
    }

    /// Compile a single pattern.
    pub fn single(pattern: &str) -> Self {
        Self::new(&[pattern])
    }

    /// True if at least one pattern matches at the start of `path`.
    pub fn is_match(&self, path: &str) -> bool {
        self.regexes.iter().any(|re| re.is_match(path))
    }
}

/// Split `items` into (matched, unmatched). Every input element lands
/// in exactly one half; both halves keep input order.
pub fn partition(patterns: &Patterns, items: &[String]) -> (Vec<String>, Vec<String>) {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for item in items {
        if patterns.is_match(item) {
            matched.push(item.clone());
        } else {
            unmatched.push(item.clone());
        }
    }
    (matched, unmatched)
}

/// Replace the first occurrence of `pattern` with `replacement` in
/// every element, then deduplicate and return in sorted order.
///
/// The sort makes the output independent of input order, which keeps
/// stem derivation (and therefore edge emission) deterministic.
pub fn normalize(pattern: &str, replacement: &str, items: &[String]) -> Vec<String> {
    let re = Regex::new(pattern).expect("hard-coded normalize pattern must compile");
    let set: std::collections::BTreeSet<String> = items
        .iter()
        .map(|item| re.replace(item, replacement).into_owned())
        .collect();
    set.into_iter().collect()
}

/// Single-element form of [`normalize`]: rewrite the first occurrence
/// of `pattern` in `item`. Used to derive an artifact name from a
/// source name, e.g. `a.cc` -> `a.o`.
pub fn rename(pattern: &str, replacement: &str, item: &str) -> String {
    let re = Regex::new(pattern).expect("hard-coded rename pattern must compile");
    re.replace(item, replacement).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partition_is_total() {
        let input = paths(&["a.cc", "a.h", "b.cc", "third_party/x"]);
        let (matched, unmatched) = partition(&Patterns::single(r".*\.cc$"), &input);
        assert_eq!(matched, paths(&["a.cc", "b.cc"]));
        assert_eq!(unmatched, paths(&["a.h", "third_party/x"]));
        assert_eq!(matched.len() + unmatched.len(), input.len());
    }

    #[test]
    fn test_partition_multiple_patterns_or() {
        let input = paths(&["a.cc", "b.c", "c.h"]);
        let (matched, unmatched) = partition(&Patterns::new(&[r".*\.cc$", r".*\.c$"]), &input);
        assert_eq!(matched, paths(&["a.cc", "b.c"]));
        assert_eq!(unmatched, paths(&["c.h"]));
    }

    #[test]
    fn test_match_from_start_semantics() {
        let input = paths(&["third_party/a", "x/third_party/b"]);
        let (matched, unmatched) = partition(&Patterns::single("third_party"), &input);
        assert_eq!(matched, paths(&["third_party/a"]));
        assert_eq!(unmatched, paths(&["x/third_party/b"]));
    }

    #[test]
    fn test_partition_empty_match_is_silent() {
        let input = paths(&["a.cc"]);
        let (matched, unmatched) = partition(&Patterns::single(r".*\.proto$"), &input);
        assert!(matched.is_empty());
        assert_eq!(unmatched, input);
    }

    #[test]
    fn test_normalize_dedupes_and_sorts() {
        let input = paths(&["p/s.pb.h", "p/s.pb.cc", "a/b.pb.cc"]);
        let stems = normalize(r"\.pb\.(cc|h)$", ".proto", &input);
        assert_eq!(stems, paths(&["a/b.proto", "p/s.proto"]));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = paths(&["p/s.pb.cc", "p/s.pb.h"]);
        let once = normalize(r"\.pb\.(cc|h)$", ".proto", &input);
        let twice = normalize(r"\.pb\.(cc|h)$", ".proto", &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rename_first_occurrence_only() {
        assert_eq!(rename("o", "0", "foo"), "f0o");
        assert_eq!(rename(r"\.cc$", ".o", "pkg/a.cc"), "pkg/a.o");
    }
}
