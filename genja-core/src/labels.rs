//! Bazel label classification.
//!
//! The bazel dependency dump is a flat list of target labels. Three
//! shapes occur:
//!
//! - `@depname//...` - an external dependency, satisfied by a system
//!   library at link time rather than by compiling anything.
//! - `//third_party/...` - vendored code we never build.
//! - `//pkg:file` - a real source or generated file inside the tree.
//!
//! [`classify`] splits a dump into the external dependency set (for
//! reporting) and the normalized local source paths. No local path
//! ever retains the `@` marker, and no vendored path survives.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static EXTERNAL_DEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@(\w*)").unwrap());

/// Vendored prefix, checked against the normalized path so both
/// `//third_party/...` and bare `third_party/...` entries are caught.
const VENDORED_PREFIX: &str = "third_party/";

/// Result of classifying one dependency dump.
#[derive(Debug, Default, Clone)]
pub struct Classified {
    /// Normalized, slash-separated relative paths, in dump order.
    pub sources: Vec<String>,
    /// Names of external dependencies referenced by the dump.
    pub external_deps: BTreeSet<String>,
}

/// Split a raw label dump into external dependency names and local
/// source paths.
///
/// Labels are handled in order of specificity: external-dependency
/// markers first, then the vendored third_party prefix, then plain
/// package labels which are normalized by stripping the leading `//`
/// and replacing `:` with `/`.
pub fn classify<I, S>(labels: I) -> Classified
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Classified::default();
    for label in labels {
        let label = label.as_ref().trim();
        if label.is_empty() {
            continue;
        }
        if let Some(caps) = EXTERNAL_DEP.captures(label) {
            out.external_deps.insert(caps[1].to_string());
            continue;
        }
        let path = label.replace(':', "/");
        let path = path.strip_prefix("//").unwrap_or(&path);
        if path.starts_with(VENDORED_PREFIX) {
            // vendored code, never built
            continue;
        }
        out.sources.push(path.to_string());
    }
    tracing::debug!(
        sources = out.sources.len(),
        deps = out.external_deps.len(),
        "classified label dump"
    );
    out
}
