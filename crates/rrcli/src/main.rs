//! relroot - normalize Roman-numeral chord corpora into Relative Root notation
//!
//! Subcommands:
//! - `relroot normalize --corpus <name> <input.jsonl>` - Normalize a record stream
//! - `relroot resolve <num> <den>...` - Resolve an applied chord
//! - `relroot lattice` - Print the spelling lattice
//! - `relroot config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relroot::CorpusKind;
use rootconf::RelrootConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "relroot")]
#[command(about = "Normalize Roman-numeral chord labels into Relative Root notation")]
#[command(version)]
struct Cli {
    /// Config file, replacing ./relroot.toml
    #[arg(long, global = true, env = "RELROOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a JSON-lines stream of raw records
    Normalize {
        /// Annotation style of the input: dcml, bps, humdrum or rock
        #[arg(short, long)]
        corpus: CorpusKind,

        /// Input file, one record per line (`-` for stdin)
        input: PathBuf,

        /// Write pieces here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the distinct chord vocabulary as JSON
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Keep cadential six-fours as separate chords
        #[arg(long)]
        no_merge: bool,

        /// Process pieces one at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Resolve a numeral applied to one or more denominators (innermost first)
    Resolve {
        /// Numerator spelling, e.g. `vii`
        num: String,

        /// Denominator spellings, e.g. `V ii` for `/V/ii`
        #[arg(required = true)]
        den: Vec<String>,

        /// The chord carries a seventh
        #[arg(long)]
        seventh: bool,
    },

    /// Print every lattice coordinate and its spelling
    Lattice,

    /// Print the effective configuration as TOML
    Config {
        /// List the files and environment variables that contributed
        #[arg(long)]
        sources: bool,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = RelrootConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.telemetry.log_level);
    debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    match cli.command {
        Commands::Normalize {
            corpus,
            input,
            output,
            vocab,
            no_merge,
            sequential,
        } => {
            let args = commands::NormalizeArgs {
                corpus,
                input,
                output,
                vocab,
                no_merge,
                sequential,
            };
            commands::normalize(&config, &args)?;
        }
        Commands::Resolve { num, den, seventh } => {
            commands::resolve(&num, &den, seventh)?;
        }
        Commands::Lattice => {
            commands::lattice()?;
        }
        Commands::Config { sources: show } => {
            commands::config(&config, &sources, show)?;
        }
    }

    Ok(())
}
