//! Genja configuration loading from `.genja.toml`.
//!
//! The config file is optional; a missing or malformed file falls back
//! to the packaging defaults built into `genja-core`. Precedence is
//! defaults, then `.genja.toml`, then environment variables.
//!
//! # Example Configuration
//!
//! ```toml
//! [toolchain]
//! cxx = "g++-8"
//! protoc = "/usr/bin/protoc"
//! proto_text = "./proto_text"
//!
//! [build]
//! soversion = "2.0"
//! target_arch = "amd64"
//!
//! [python]
//! incdir = "/usr/include/python3.7m"
//! libdir = "/usr/lib/python3/dist-packages"
//! version = "3.7"
//!
//! [output]
//! color = true
//! ```

use genja_core::BuildConfig;
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure loaded from `.genja.toml`.
///
/// All sections are optional and default to the built-in packaging
/// values if not specified.
#[derive(Debug, Deserialize, Default)]
pub struct GenjaConfig {
    /// Tool paths.
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Shared-object and architecture settings.
    #[serde(default)]
    pub build: BuildSection,

    /// Python binding settings.
    #[serde(default)]
    pub python: PythonConfig,

    /// Output preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Tool path overrides.
#[derive(Debug, Deserialize, Default)]
pub struct ToolchainConfig {
    /// C++ compiler. Default: `g++`.
    #[serde(default)]
    pub cxx: Option<String>,

    /// Protocol buffer compiler. Default: `/usr/bin/protoc`.
    #[serde(default)]
    pub protoc: Option<String>,

    /// Path of the proto_text generator executable.
    /// Default: `./proto_text`.
    #[serde(default)]
    pub proto_text: Option<String>,
}

/// Shared-object and architecture settings.
#[derive(Debug, Deserialize, Default)]
pub struct BuildSection {
    /// Soversion appended to shared object sonames. Default: `2.0`.
    #[serde(default)]
    pub soversion: Option<String>,

    /// Target architecture in dpkg terms. Default: `amd64`.
    /// The `DEB_HOST_ARCH` environment variable overrides this.
    #[serde(default)]
    pub target_arch: Option<String>,
}

/// Python binding settings.
#[derive(Debug, Deserialize, Default)]
pub struct PythonConfig {
    /// Python include directory.
    #[serde(default)]
    pub incdir: Option<String>,

    /// Python library directory.
    #[serde(default)]
    pub libdir: Option<String>,

    /// Python version, informational for the pywrap variant.
    #[serde(default)]
    pub version: Option<String>,
}

/// Output preferences.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Whether to use colored output.
    ///
    /// Defaults to `true` when stdout is a TTY.
    #[serde(default)]
    pub color: Option<bool>,
}

impl GenjaConfig {
    /// Load configuration from `.genja.toml` in the given directory.
    ///
    /// If the config file doesn't exist or can't be parsed, returns
    /// defaults. Parse errors are logged as warnings but don't cause
    /// failures.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(".genja.toml");
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse .genja.toml: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read .genja.toml: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Resolve the build configuration: packaging defaults, then the
    /// config file values, then environment variables on top.
    pub fn build_config(&self) -> BuildConfig {
        let mut cfg = BuildConfig::default();
        if let Some(v) = &self.toolchain.cxx {
            cfg.cxx = v.clone();
        }
        if let Some(v) = &self.toolchain.protoc {
            cfg.protoc = v.clone();
        }
        if let Some(v) = &self.toolchain.proto_text {
            cfg.proto_text = v.clone();
        }
        if let Some(v) = &self.build.soversion {
            cfg.soversion = v.clone();
        }
        if let Some(v) = &self.build.target_arch {
            cfg.target_arch = v.clone();
        }
        if let Some(v) = &self.python.incdir {
            cfg.py_incdir = v.clone();
        }
        if let Some(v) = &self.python.libdir {
            cfg.py_libdir = v.clone();
        }
        if let Some(v) = &self.python.version {
            cfg.py_ver = v.clone();
        }
        cfg.apply_env();
        cfg
    }

    /// Check if colored output should be used.
    ///
    /// Returns the configured value, or `None` to use auto-detection.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}
