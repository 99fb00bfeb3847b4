use clap::{Parser, Subcommand};
use colored::Colorize;
use log::debug;
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;

use michelson_core::report::CheckReport;
use michelson_core::{digest, parse_contract_with, Contract, ParseOptions};

/// Michelson smart-contract source parser
///
/// Parse, check and fingerprint Michelson contracts.
#[derive(Parser)]
#[command(name = "michelson", version, about, long_about = None)]
struct Cli {
    /// Suppress output on success
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log parser progress (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Maximum nesting depth; overrides the config file
    #[arg(long, global = true, value_name = "N")]
    max_depth: Option<usize>,

    /// JSON file with parse options, e.g. {"max_depth": 256}
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a contract and print its AST
    Parse {
        /// Path to .tz file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a contract parses
    Check {
        /// Path to .tz file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute semantic hash (SHA-256) of a contract
    Hash {
        /// Path to .tz file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    Config(michelson_core::Error),

    #[error("{path}: {source}")]
    Parse {
        path: String,
        source: michelson_core::Error,
    },

    #[error("{0}")]
    Output(michelson_core::Error),
}

impl CliError {
    /// 1 = the contract is invalid, 2 = anything else went wrong
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Parse { .. } => 1,
            CliError::Io { .. } | CliError::Config(_) | CliError::Output(_) => 2,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn load_options(cli: &Cli) -> Result<ParseOptions, CliError> {
    let mut options = match &cli.config {
        Some(path) => ParseOptions::from_json(&read_file(path)?).map_err(CliError::Config)?,
        None => ParseOptions::default(),
    };
    if let Some(limit) = cli.max_depth {
        options.max_depth = Some(limit);
    }
    debug!("Parse options: {:?}", options);
    Ok(options)
}

fn parse_file(path: &Path, options: &ParseOptions) -> Result<Contract, CliError> {
    let source = read_file(path)?;
    parse_contract_with(&source, options).map_err(|source| CliError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn cmd_parse(file: &Path, json: bool, quiet: bool, options: &ParseOptions) -> Result<(), CliError> {
    let contract = parse_file(file, options)?;
    if quiet {
        return Ok(());
    }
    if json {
        let text = serde_json::to_string_pretty(&contract)
            .map_err(|e| CliError::Output(michelson_core::Error::SerializationError(e.to_string())))?;
        println!("{}", text);
    } else {
        println!("{:#?}", contract);
    }
    Ok(())
}

fn cmd_check(file: &Path, json: bool, quiet: bool, options: &ParseOptions) -> Result<(), CliError> {
    let source = read_file(file)?;
    let result = parse_contract_with(&source, options);
    if json {
        let report = CheckReport::from_result(&result);
        if !(quiet && report.valid) {
            println!("{}", report.to_json().map_err(CliError::Output)?);
        }
    } else if result.is_ok() && !quiet {
        println!("{} {}", "✓".green().bold(), format!("{} is valid", file.display()).green());
    }
    result.map(|_| ()).map_err(|source| CliError::Parse {
        path: file.display().to_string(),
        source,
    })
}

fn cmd_hash(file: &Path, options: &ParseOptions) -> Result<(), CliError> {
    let contract = parse_file(file, options)?;
    let hash = digest::semantic_hash(&contract).map_err(CliError::Output)?;
    println!("{}", hash);
    Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Parse { file, json } => cmd_parse(file, *json, cli.quiet, &load_options(cli)?),
        Commands::Check { file, json } => cmd_check(file, *json, cli.quiet, &load_options(cli)?),
        Commands::Hash { file } => cmd_hash(file, &load_options(cli)?),
        Commands::Version => {
            println!(
                "michelson {} (michelson-core {})",
                env!("CARGO_PKG_VERSION"),
                michelson_core::VERSION
            );
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(&cli) {
        Ok(()) => 0,
        Err(err) => {
            // --json check failures already reported on stdout
            let reported = matches!(
                (&cli.command, &err),
                (Commands::Check { json: true, .. }, CliError::Parse { .. })
            );
            if !reported {
                eprintln!("{} {}", "error:".red().bold(), err);
            }
            err.exit_code()
        }
    };

    process::exit(exit_code);
}
