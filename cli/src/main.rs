// Licensed under the Apache-2.0 license

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use regmap_description::Top;
use regmap_header_gen::{generate_header, HeaderConfig};
use simple_logger::SimpleLogger;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "regmap",
    author,
    version,
    about = "Compile a YAML register map into a C header"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a C header from a register description
    Header {
        /// Register description
        #[arg(short, long, value_name = "FILE")]
        yaml: PathBuf,
        /// Header destination; stdout when omitted
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Header name; defaults to the description's file stem
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Validate a register description without emitting anything
    Check {
        /// Register description
        #[arg(short, long, value_name = "FILE")]
        yaml: PathBuf,
    },
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn load(path: &Path) -> Result<Top> {
    Top::from_file(path).with_context(|| format!("failed to load {}", path.display()))
}

fn header(yaml: &Path, output: Option<&Path>, name: Option<String>) -> Result<()> {
    let top = load(yaml)?;
    let config = match name {
        Some(name) => HeaderConfig::new(&name),
        None => HeaderConfig::from_path(yaml),
    };
    let text = generate_header(&top, &config)
        .with_context(|| format!("failed to generate header for {}", yaml.display()))?;

    match output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn check(yaml: &Path) -> Result<()> {
    let top = load(yaml)?;
    let registers: usize = top.pages().iter().map(|p| p.regs().len()).sum();
    println!(
        "{}: {} pages, {} registers, {} addressable words",
        top.name(),
        top.pages().len(),
        registers,
        top.flat_registers().len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(log_level(cli.verbose))
        .init()
        .context("failed to initialize logger")?;

    match cli.command {
        Command::Header { yaml, output, name } => header(&yaml, output.as_deref(), name),
        Command::Check { yaml } => check(&yaml),
    }
}
