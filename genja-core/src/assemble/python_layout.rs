//! Python package layout.
//!
//! The one family that produces no build graph. It filters the
//! combined source, generated and declared-API lists down to python
//! files and renders a shell script that installs each file into a
//! destination tree passed as `$1`, copy-if-present, then installs
//! the native extension unconditionally.

use crate::filter::{partition, Patterns};

/// Options for the python layout family.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// File name of the native extension installed alongside the
    /// python tree, e.g. `_pywrap_tensorflow_internal.so`.
    pub extension: String,
}

/// Rendered installation script plus the file count for reporting.
#[derive(Debug)]
pub struct InstallScript {
    pub script: String,
    pub count: usize,
}

pub fn assemble(
    sources: &[String],
    generated: &[String],
    api: &[String],
    opts: &LayoutOptions,
) -> InstallScript {
    let combined: Vec<String> = sources
        .iter()
        .chain(generated)
        .chain(api)
        .cloned()
        .collect();
    let (pylist, _) = partition(&Patterns::single(r".*\.py$"), &combined);
    tracing::debug!(count = pylist.len(), "python files for layout");

    let mut script = String::new();
    script.push_str("# Generated file, do not edit.\n");
    script.push_str("filelist=\"\n");
    for py in &pylist {
        script.push_str(py);
        script.push('\n');
    }
    script.push_str("\"\n\n");
    script.push_str("for f in $filelist ; do\n");
    script.push_str("    if test -r $f; then\n");
    script.push_str("        install -Dm0644 $f $1/$f\n");
    script.push_str("    else\n");
    script.push_str("        echo $f is missing\n");
    script.push_str("    fi\n");
    script.push_str("done\n\n");
    script.push_str(&format!(
        "install -Dm0644 {ext} $1/tensorflow/python/{ext}\n",
        ext = opts.extension
    ));

    InstallScript {
        script,
        count: pylist.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn opts() -> LayoutOptions {
        LayoutOptions {
            extension: "_pywrap_tensorflow_internal.so".into(),
        }
    }

    #[test]
    fn test_only_python_files_listed() {
        let srcs = paths(&["tensorflow/python/ops/math_ops.py", "tensorflow/c/c_api.cc"]);
        let out = assemble(&srcs, &[], &[], &opts());
        assert_eq!(out.count, 1);
        assert!(out.script.contains("tensorflow/python/ops/math_ops.py\n"));
        assert!(!out.script.contains("c_api.cc"));
    }

    #[test]
    fn test_api_list_included() {
        let api = paths(&["tensorflow/_api/v1/math/__init__.py"]);
        let out = assemble(&[], &[], &api, &opts());
        assert_eq!(out.count, 1);
        assert!(out.script.contains("tensorflow/_api/v1/math/__init__.py\n"));
    }

    #[test]
    fn test_copy_if_present_and_extension_install() {
        let out = assemble(&paths(&["a/b.py"]), &[], &[], &opts());
        assert!(out.script.contains("if test -r $f; then\n"));
        assert!(out.script.contains("install -Dm0644 $f $1/$f\n"));
        assert!(out.script.contains("echo $f is missing\n"));
        assert!(out.script.contains(concat!(
            "install -Dm0644 _pywrap_tensorflow_internal.so ",
            "$1/tensorflow/python/_pywrap_tensorflow_internal.so\n"
        )));
    }
}
