//! cellkit CLI: inspect, hash and convert Bag-of-Cells files.

mod commands;
mod config;
mod detect;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use config::{CellkitConfig, OutputFormat};

#[derive(Parser)]
#[command(name = "cellkit", version, about = "Inspect and convert Bag-of-Cells files")]
struct Cli {
    /// Log decoder and encoder details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default cellkit.toml in the current directory
    Init {
        /// Overwrite an existing cellkit.toml
        #[arg(long)]
        force: bool,
    },
    /// Show header fields, root hashes and cell trees
    Inspect {
        /// BOC file (binary, hex or base64)
        input: PathBuf,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the representation hash of every root
    Hash {
        /// BOC file (binary, hex or base64)
        input: PathBuf,
        /// Print base64 instead of hex
        #[arg(long)]
        base64: bool,
    },
    /// Re-encode a single-root BOC
    Convert {
        /// BOC file (binary, hex or base64)
        input: PathBuf,
        /// Output encoding (default: [output] format from cellkit.toml, or hex)
        #[arg(long, value_enum)]
        to: Option<OutputFormat>,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Leave out the offset index
        #[arg(long)]
        no_idx: bool,
        /// Leave out the CRC32C checksum
        #[arg(long)]
        no_crc: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { force } => commands::init::run(&cwd, force),

        Commands::Inspect { input, json } => commands::inspect::run(&input, json),

        Commands::Hash { input, base64 } => commands::hash::run(&input, base64),

        Commands::Convert {
            input,
            to,
            output,
            no_idx,
            no_crc,
        } => {
            let config = CellkitConfig::load_or_default(&cwd)?;
            commands::convert::run(&input, &config, to, output.as_deref(), no_idx, no_crc)
        }
    }
}
