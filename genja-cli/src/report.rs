//! Diagnostic reporting.
//!
//! Advisory output for the packaging maintainer: the external
//! dependency set gathered from the label dump, the glob summary and
//! the unresolved residue. Nothing here affects the produced graph or
//! the exit status.

use colored::Colorize;
use std::collections::BTreeSet;

/// Print the external dependency names found in a label dump.
pub fn depends(deps: &BTreeSet<String>) {
    println!("{}", "Required Depends:".cyan());
    for dep in deps {
        println!("    {dep}");
    }
}

/// Print the size of the classified source set.
pub fn globbed(count: usize) {
    println!("Globbed {} source files", count.to_string().cyan());
}

/// Print one line per unresolved entry plus a summary count. Silent
/// when everything was claimed.
///
/// Residue is advisory. The graph stays usable; these are typically
/// documentation files or sources for other platforms.
pub fn residue(unresolved: &[String]) {
    if unresolved.is_empty() {
        return;
    }
    for entry in unresolved {
        println!("{} {}", "? HowToDealWith".yellow(), entry);
    }
    println!(
        "{}",
        format!("{} files to be dealt with left unresolved", unresolved.len()).red()
    );
}

/// Print the path an output file was written to.
pub fn written(path: &str) {
    println!("=> {path}");
}
