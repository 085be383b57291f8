//! Genja CLI - ninja build planner for the TensorFlow Debian package.
//!
//! Each subcommand reads bazel dependency dumps, plans the build graph
//! for one artifact family and writes a ninja file (or, for the python
//! layout, an installation script). Nothing is compiled here; ninja
//! executes the plan afterwards.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod report;

use config::GenjaConfig;

/// Plan ninja build graphs from bazel dependency dumps.
///
/// genja classifies the labels in a bazel dependency dump, assembles
/// the build graph for one artifact family per invocation and writes
/// it out in ninja syntax for the downstream executor.
#[derive(Parser)]
#[command(name = "genja")]
#[command(author, version)]
#[command(about = "Plan ninja build graphs from bazel dependency dumps")]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan the standalone proto_text generator executable
    ProtoText {
        /// Bazel dump of source labels
        #[arg(short = 'i', long = "input")]
        input: String,

        /// Bazel dump of generated-file labels
        #[arg(short = 'g', long = "generated")]
        generated: String,

        /// Ninja file to write
        #[arg(short = 'o', long = "output", default_value = "proto_text.ninja")]
        output: String,
    },

    /// Plan the core runtime library and the op-generator byproduct
    Framework {
        /// Bazel dump of source labels
        #[arg(short = 'i', long = "input")]
        input: String,

        /// Bazel dump of generated-file labels
        #[arg(short = 'g', long = "generated")]
        generated: String,

        /// Ninja file to write
        #[arg(
            short = 'o',
            long = "output",
            default_value = "libtensorflow_framework.ninja"
        )]
        output: String,

        /// Side file listing the headers encountered while filtering
        #[arg(
            short = 'H',
            long = "headers",
            default_value = "libtensorflow_framework.hdrs"
        )]
        headers: String,

        /// File name of the shared object to plan
        #[arg(short = 'O', long = "artifact")]
        artifact: String,

        /// File name of the op-generator byproduct shared object
        #[arg(short = 'b', long = "byproduct")]
        byproduct: String,
    },

    /// Plan one of the API shared library variants
    Library {
        /// Bazel dump of source labels
        #[arg(short = 'i', long = "input")]
        input: String,

        /// Bazel dump of generated-file labels
        #[arg(short = 'g', long = "generated")]
        generated: String,

        /// Ninja file to write
        #[arg(short = 'o', long = "output")]
        output: String,

        /// File name of the shared object; also selects the variant
        #[arg(short = 'O', long = "artifact")]
        artifact: String,

        /// Side file listing the headers encountered while filtering
        #[arg(short = 'H', long = "headers")]
        headers: String,
    },

    /// Plan the generated-sources bundle
    Generated {
        /// Bazel dump of generated-file labels
        #[arg(short = 'g', long = "generated")]
        generated: String,

        /// Ninja file to write
        #[arg(short = 'o', long = "output")]
        output: String,
    },

    /// Emit the python package installation script
    PythonLayout {
        /// Bazel dump of source labels
        #[arg(short = 'i', long = "input")]
        input: String,

        /// Bazel dump of generated-file labels
        #[arg(short = 'g', long = "generated")]
        generated: String,

        /// Installation script to write
        #[arg(short = 'o', long = "output", default_value = "pippackage.sh")]
        output: String,

        /// File name of the native extension to install
        #[arg(
            short = 'O',
            long = "extension",
            default_value = "_pywrap_tensorflow_internal.so"
        )]
        extension: String,

        /// Declared-API list, one path per line
        #[arg(long, default_value = "api_init_files_list.txt")]
        api: String,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration from .genja.toml
    let config = GenjaConfig::load(std::path::Path::new("."));

    // Apply color override from config if set
    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }

    // Resolve build settings: defaults < .genja.toml < environment
    let build = config.build_config();

    match cli.command {
        Commands::ProtoText {
            input,
            generated,
            output,
        } => commands::proto_text::run(&input, &generated, &output, &build),
        Commands::Framework {
            input,
            generated,
            output,
            headers,
            artifact,
            byproduct,
        } => commands::framework::run(
            &input, &generated, &output, &headers, &artifact, &byproduct, &build,
        ),
        Commands::Library {
            input,
            generated,
            output,
            artifact,
            headers,
        } => commands::library::run(&input, &generated, &output, &artifact, &headers, &build),
        Commands::Generated { generated, output } => {
            commands::generated::run(&generated, &output, &build)
        }
        Commands::PythonLayout {
            input,
            generated,
            output,
            extension,
            api,
        } => commands::python_layout::run(&input, &generated, &output, &extension, &api),
    }
}
