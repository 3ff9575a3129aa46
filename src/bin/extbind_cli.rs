//! extbind CLI - Bridge interface for the host build
//!
//! Commands: generate, build, reconcile, guard
//! Outputs JSON to stdout
//! Returns 1 on fatal errors, 2 when a module is gated off for the platform

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::error;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use extbind_core::{
    generator::DEFAULT_IMPL_MARKER, header_guard, reconcile_sources, Generator, GeneratorOptions,
    Manifest, ModulePipeline, PipelineError, RuleSet, SourceEntry, StdFileSystem,
};

#[derive(Parser)]
#[command(name = "extbind-cli")]
#[command(about = "extbind CLI - Extension Binding Generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate X.gen.hpp and X.gen.cpp for one unit
    Generate {
        /// Any file of the unit, usually X.hpp
        #[arg(short, long)]
        input: PathBuf,

        /// JSON rules file ({"blacklist": [...], "function_params": {...}})
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Macro defined inside generated headers
        #[arg(long, default_value = DEFAULT_IMPL_MARKER)]
        marker: String,
    },

    /// Generate every unit of a module manifest
    Build {
        /// Module manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Target platform
        #[arg(short, long)]
        platform: String,
    },

    /// Swap a raw implementation for its generated one in a source list
    Reconcile {
        /// Raw implementation path
        #[arg(long)]
        raw: PathBuf,

        /// Generated implementation path
        #[arg(long)]
        generated: PathBuf,

        /// JSON array of source entries
        #[arg(short, long)]
        sources: String,
    },

    /// Print the include guard for a generated header name
    Guard {
        /// Generated header file name, e.g. foo_bar.gen.hpp
        name: String,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { input, rules, marker } => {
            let rules = match rules {
                Some(path) => match RuleSet::load(&path) {
                    Ok(r) => r,
                    Err(e) => return fail(&e),
                },
                None => RuleSet::default(),
            };

            let options = GeneratorOptions {
                impl_marker: marker,
                ..GeneratorOptions::default()
            };
            let generator = Generator::with_options(StdFileSystem::new(), options);

            match generator.generate(&input, &rules.blacklist, &rules.function_params) {
                Ok(pair) => print_json(&pair),
                Err(e) => fail(&e),
            }
        }

        Commands::Build { manifest, platform } => {
            let loaded = match Manifest::load(&manifest) {
                Ok(m) => m,
                Err(e) => return fail(&e),
            };

            let root = manifest.parent().unwrap_or_else(|| Path::new("."));
            let pipeline = ModulePipeline::new(StdFileSystem::rooted(root));

            match pipeline.build(&loaded, &platform) {
                Ok(report) => print_json(&report),
                Err(e @ PipelineError::UnsupportedPlatform { .. }) => {
                    let output = serde_json::json!({
                        "success": false,
                        "skipped": true,
                        "error": e.to_string(),
                    });
                    println!("{}", output);
                    ExitCode::from(2)
                }
                Err(e) => fail(&e),
            }
        }

        Commands::Reconcile { raw, generated, sources } => {
            let entries: Vec<SourceEntry> = match serde_json::from_str(&sources) {
                Ok(s) => s,
                Err(e) => return fail(&e),
            };
            print_json(&reconcile_sources(&entries, &generated, &raw))
        }

        Commands::Guard { name } => {
            println!("{}", header_guard(&name));
            ExitCode::SUCCESS
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn fail(e: &dyn std::error::Error) -> ExitCode {
    error!("{}", e);
    let output = serde_json::json!({
        "success": false,
        "error": e.to_string(),
    });
    println!("{}", output);
    ExitCode::FAILURE
}
