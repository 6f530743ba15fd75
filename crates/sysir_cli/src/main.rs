//! Command-line driver for the sysir pipeline: lex → parse → assemble →
//! type-check → lower to C, exposing the `asm`/`to_c` entry points as a
//! standalone binary.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod pipeline;

#[derive(Parser)]
#[command(name = "sysir")]
#[command(about = "Assemble, verify, and lower sysir textual assembly to C", long_about = None)]
struct Cli {
    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble, verify, and lower an assembly file to C, printing the
    /// result (or writing it to `--output`).
    Build {
        /// Path to a textual assembly source file
        input: PathBuf,

        /// Where to write the lowered C source; defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Assemble and verify an assembly file without lowering it, useful
    /// for checking that a module is well-formed.
    Check {
        /// Path to a textual assembly source file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.verbose {
        0 => log::set_max_level(log::LevelFilter::Warn),
        1 => log::set_max_level(log::LevelFilter::Info),
        2 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Build { input, output } => {
            let source = read_input(&input)?;
            let c_source = pipeline::build(&source)?;
            match output {
                Some(path) => {
                    fs::write(&path, c_source)
                        .with_context(|| format!("writing C output to {}", path.display()))?;
                }
                None => print!("{c_source}"),
            }
            Ok(())
        }
        Commands::Check { input } => {
            let source = read_input(&input)?;
            pipeline::check(&source)?;
            log::info!("{} is well-formed", input.display());
            Ok(())
        }
    }
}

fn read_input(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading assembly source from {}", path.display()))
}
