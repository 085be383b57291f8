//! Build configuration.
//!
//! Everything the emitted ninja preamble depends on lives here: tool
//! paths, the baseline compiler and linker flags, include directories,
//! the default library set, the shared-object soversion and the target
//! architecture. One `BuildConfig` is constructed per run; there is no
//! process-wide state.
//!
//! Environment variables are additive: `CPPFLAGS`, `CXXFLAGS` and
//! `LDFLAGS` are appended after the baseline flags, never replacing
//! them. `DEB_HOST_ARCH` and the `PY_*` variables override their
//! defaults outright.

use std::env;

/// Per-run build configuration with distribution-packaging defaults.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// C++ compiler.
    pub cxx: String,
    /// Protocol buffer compiler.
    pub protoc: String,
    /// Path of the proto_text generator built by the `proto-text`
    /// family (and executed by the generated-sources family).
    pub proto_text: String,
    /// Soversion appended to every shared object soname.
    pub soversion: String,
    pub cppflags: String,
    pub cxxflags: String,
    pub ldflags: String,
    pub includes: String,
    /// Default library set for executables; individual edges override
    /// `LIBS` with curated subsets.
    pub libs: String,
    /// Target architecture in dpkg terms; several pipelines only run
    /// on amd64.
    pub target_arch: String,
    /// Python include directory for binding sources.
    pub py_incdir: String,
    /// Python library directory for binding sources.
    pub py_libdir: String,
    /// Python version, informational for the pywrap variant.
    pub py_ver: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cxx: "g++".into(),
            protoc: "/usr/bin/protoc".into(),
            proto_text: "./proto_text".into(),
            soversion: "2.0".into(),
            cppflags: "-D_FORTIFY_SOURCE=2".into(),
            cxxflags: concat!(
                "-std=c++14 -O2 -pipe -fPIC -gsplit-dwarf -DNDEBUG ",
                "-fstack-protector-strong -w"
            )
            .into(),
            ldflags: "-Wl,-z,relro -Wl,-z,now".into(),
            includes: concat!(
                "-I. -I./debian/embedded/eigen3 -I./third_party/eigen3/ ",
                "-I/usr/include/gemmlowp -I/usr/include/llvm-c-7 ",
                "-I/usr/include/llvm-7 -Ithird_party/toolchains/gpus/cuda/ ",
                "-I./debian/embedded/abseil/"
            )
            .into(),
            libs: concat!(
                "-lpthread -lprotobuf -lnsync -lnsync_cpp -ldouble-conversion ",
                "-ldl -lm -lz -lre2 -ljpeg -lpng -lsqlite3 -llmdb -lsnappy ",
                "-lgif -lLLVM-7"
            )
            .into(),
            target_arch: "amd64".into(),
            py_incdir: "/usr/include/python3".into(),
            py_libdir: "/usr/lib/python3/dist-packages".into(),
            py_ver: "3".into(),
        }
    }
}

impl BuildConfig {
    /// Defaults plus environment input applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Apply environment input on top of the current values. Flag
    /// variables append; the rest replace.
    pub fn apply_env(&mut self) {
        append_var(&mut self.cppflags, env::var("CPPFLAGS").ok());
        append_var(&mut self.cxxflags, env::var("CXXFLAGS").ok());
        append_var(&mut self.ldflags, env::var("LDFLAGS").ok());
        if let Ok(arch) = env::var("DEB_HOST_ARCH") {
            self.target_arch = arch;
        }
        if let Ok(v) = env::var("PY_INCDIR") {
            self.py_incdir = v;
        }
        if let Ok(v) = env::var("PY_LIBDIR") {
            self.py_libdir = v;
        }
        if let Ok(v) = env::var("PY_VER") {
            self.py_ver = v;
        }
    }

    /// True when planning for the primary architecture. gRPC stub
    /// generation and the debug-ops sources are amd64-only.
    pub fn is_amd64(&self) -> bool {
        self.target_arch == "amd64"
    }
}

fn append_var(flags: &mut String, value: Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        if !value.is_empty() {
            flags.push(' ');
            flags.push_str(value);
        }
    }
}
