//! Command-line interface definition for fob-emscripten.
//!
//! # Command Structure
//!
//! - `fob-emscripten patch` - Patch a loader and write it as a build would
//! - `fob-emscripten check` - Report which patches would apply
//! - `fob-emscripten watch` - Rebuild native sources on change

use clap::{Args, Parser, Subcommand, ValueEnum};
use fob_plugin_emscripten::{OutputFormat, PatchOptions};
use std::path::PathBuf;

/// fob-emscripten - Emscripten loader patcher
#[derive(Parser, Debug)]
#[command(
    name = "fob-emscripten",
    version,
    about = "Patch Emscripten loaders and rebuild native sources",
    long_about = "Applies the fob Emscripten plugin's loader patches outside of a bundler\n\
                  (Electron support, external WASM URLs, worker URL hoisting) and watches\n\
                  native sources to re-run the Emscripten build on change."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Patch a loader and write it to the output directory
    ///
    /// Runs the pre-transform patches on the loader source, writes it as
    /// `index.<format>.js` and finishes with the post-write patch.
    Patch(PatchArgs),

    /// Report which patches would apply to a loader, without writing
    Check(CheckArgs),

    /// Watch native sources and re-run the build command on change
    Watch(WatchArgs),
}

/// Options shared by commands that read configuration
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Project root; `fob-emscripten.toml` is looked up here
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Explicit config file (must exist)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Patch switches; each one enables its patch on top of the config file
#[derive(Args, Debug, Clone, Default)]
pub struct PatchFlags {
    /// Treat Electron renderers as web rather than Node
    #[arg(long)]
    pub electron: bool,

    /// Keep the WASM binary external to the bundle
    #[arg(long)]
    pub external_wasm: bool,

    /// Hoist the pthread worker URL out of `new Worker(..)`
    #[arg(long)]
    pub hoist_worker: bool,
}

impl PatchFlags {
    /// Overlay the flags on configured options
    pub fn apply_to(&self, options: PatchOptions) -> PatchOptions {
        PatchOptions {
            add_electron_support: options.add_electron_support || self.electron,
            disable_inline_wasm: options.disable_inline_wasm || self.external_wasm,
            hoist_worker_url: options.hoist_worker_url || self.hoist_worker,
        }
    }
}

/// Arguments for the patch command
#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Loader source generated by Emscripten (usually dist-wasm/index.js)
    #[arg(value_name = "LOADER")]
    pub input: PathBuf,

    /// Directory the patched loader is written to
    #[arg(short, long, default_value = "dist", value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Output format, used in the emitted file name
    #[arg(short, long, value_enum, default_value = "es")]
    pub format: Format,

    #[command(flatten)]
    pub patches: PatchFlags,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Loader source to inspect
    #[arg(value_name = "LOADER")]
    pub input: PathBuf,

    /// Check every pre-transform patch regardless of configuration
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub patches: PatchFlags,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the watch command
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Override the configured build command
    #[arg(long, value_name = "CMD")]
    pub command: Option<String>,

    /// Override the configured debounce delay
    #[arg(long, value_name = "MS")]
    pub debounce: Option<u64>,

    /// Run the build command once before watching
    #[arg(long)]
    pub initial: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Output format accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// ES modules
    #[value(alias = "esm")]
    Es,
    /// CommonJS
    Cjs,
    /// Immediately invoked function expression
    Iife,
    /// Universal module definition
    Umd,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Es => OutputFormat::Es,
            Format::Cjs => OutputFormat::Cjs,
            Format::Iife => OutputFormat::Iife,
            Format::Umd => OutputFormat::Umd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_patch() {
        let cli = Cli::parse_from([
            "fob-emscripten",
            "patch",
            "dist-wasm/index.js",
            "--format",
            "esm",
            "--electron",
        ]);
        let Command::Patch(args) = cli.command else {
            panic!("expected patch command");
        };
        assert_eq!(args.format, Format::Es);
        assert_eq!(args.out_dir, PathBuf::from("dist"));
        assert!(args.patches.electron);
        assert!(!args.patches.external_wasm);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["fob-emscripten", "-v", "-q", "check", "x.js"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_overlay_config() {
        let flags = PatchFlags {
            hoist_worker: true,
            ..Default::default()
        };
        let options = flags.apply_to(PatchOptions::new().with_electron_support(true));
        assert!(options.add_electron_support);
        assert!(options.hoist_worker_url);
        assert!(!options.disable_inline_wasm);
    }
}
