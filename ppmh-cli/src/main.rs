// PPMH CLI - Command-line front end
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # PPMH CLI
//!
//! Normalize, compress, decompress and compare context orders on text files.
//!
//! ## Usage
//!
//! ```bash
//! # Fold a text file into the 28-symbol alphabet
//! ppmh-cli normalize -i book.txt -o book.norm
//!
//! # Static codebook, order 4, codebook also saved as JSON
//! ppmh-cli compress -i book.txt -o book.ppmh --codebook codebook.json
//!
//! # Per-position codebooks need the training text to decode
//! ppmh-cli compress -i book.txt -o book.ppmh --mode per-position
//! ppmh-cli decompress -i book.ppmh -o book.out --model-text book.txt
//!
//! # Compare orders 0..=5 in both modes
//! ppmh-cli report -i book.txt
//! ```

mod commands;
mod error;
mod normalize;
mod report;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{compress_file, decompress_file, load_symbols, normalize_file, CompressOptions};
use error::CliError;
use ppmh::context::{DEFAULT_ORDER, MAX_ORDER};
use ppmh::{CodingMode, WeightSource};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize a text file into the compressor's alphabet
    Normalize {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compress a text file into a .ppmh container
    Compress {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Maximum context order
        #[arg(short = 'k', long, default_value_t = DEFAULT_ORDER)]
        order: usize,
        /// Coding mode
        #[arg(short, long, value_enum, default_value_t = ModeArg::Static)]
        mode: ModeArg,
        /// Weights for the static codebook
        #[arg(long, value_enum, default_value_t = WeightsArg::Predicted)]
        weights: WeightsArg,
        /// Also write the static codebook as JSON
        #[arg(long)]
        codebook: Option<PathBuf>,
        /// Input is already normalized
        #[arg(long)]
        raw: bool,
    },

    /// Decompress a .ppmh container back into text
    Decompress {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// JSON codebook replacing the embedded one
        #[arg(long)]
        codebook: Option<PathBuf>,
        /// Text the per-position model was trained on
        #[arg(long)]
        model_text: Option<PathBuf>,
        /// Model text is already normalized
        #[arg(long)]
        raw: bool,
    },

    /// Compare orders 0..=max-order in both coding modes
    Report {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short = 'k', long, default_value_t = MAX_ORDER)]
        max_order: usize,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Input is already normalized
        #[arg(long)]
        raw: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Static,
    PerPosition,
}

impl From<ModeArg> for CodingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Static => CodingMode::Static,
            ModeArg::PerPosition => CodingMode::PerPosition,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum WeightsArg {
    /// Summed predicted probabilities
    Predicted,
    /// Symbol occurrence counts
    Frequency,
}

impl From<WeightsArg> for WeightSource {
    fn from(weights: WeightsArg) -> Self {
        match weights {
            WeightsArg::Predicted => WeightSource::PredictedProbability,
            WeightsArg::Frequency => WeightSource::SymbolFrequency,
        }
    }
}

fn run(command: Command) -> error::Result<()> {
    match command {
        Command::Normalize { input, output } => {
            normalize_file(&input, &output)?;
        }
        Command::Compress {
            input,
            output,
            order,
            mode,
            weights,
            codebook,
            raw,
        } => {
            let options = CompressOptions {
                order,
                mode: mode.into(),
                weights: weights.into(),
                raw,
            };
            let stats = compress_file(&input, &output, codebook.as_deref(), &options)?;
            println!("{}", stats.report());
        }
        Command::Decompress {
            input,
            output,
            codebook,
            model_text,
            raw,
        } => {
            decompress_file(
                &input,
                &output,
                codebook.as_deref(),
                model_text.as_deref(),
                raw,
            )?;
        }
        Command::Report {
            input,
            max_order,
            json,
            raw,
        } => {
            let symbols = load_symbols(&input, raw)?;
            info!("Measuring {} symbols, orders 0..={}", symbols.len(), max_order);
            let rows = report::measure(&symbols, max_order)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", report::render_table(&rows));
            }

            if let Some(row) = rows.iter().find(|r| !r.roundtrip_ok) {
                return Err(CliError::RoundtripMismatch {
                    order: row.order,
                    mode: format!("{:?}", row.mode),
                });
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("PPMH CLI v{}", env!("CARGO_PKG_VERSION"));

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_compress_defaults() {
        let args = Args::try_parse_from(["ppmh-cli", "compress", "-i", "a.txt", "-o", "a.ppmh"])
            .unwrap();
        match args.command {
            Command::Compress {
                order, mode, raw, ..
            } => {
                assert_eq!(order, DEFAULT_ORDER);
                assert_eq!(CodingMode::from(mode), CodingMode::Static);
                assert!(!raw);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_per_position_mode() {
        let args = Args::try_parse_from([
            "ppmh-cli",
            "compress",
            "-i",
            "a.txt",
            "-o",
            "a.ppmh",
            "--mode",
            "per-position",
            "-k",
            "2",
            "--weights",
            "frequency",
        ])
        .unwrap();
        match args.command {
            Command::Compress {
                order,
                mode,
                weights,
                ..
            } => {
                assert_eq!(order, 2);
                assert_eq!(CodingMode::from(mode), CodingMode::PerPosition);
                assert_eq!(WeightSource::from(weights), WeightSource::SymbolFrequency);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
