//! `optic`: build query plans from plan scripts and print the wire document

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod logging;

use config::Config;

#[derive(Parser)]
#[command(name = "optic")]
#[command(about = "Build query plans from scripts and export the wire document")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file (default: ./optic.yaml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a plan script and print its wire document
    Export {
        /// Script file (reads stdin if not provided)
        file: Option<PathBuf>,

        /// Pretty-print the document
        #[arg(short, long)]
        pretty: bool,

        /// Print the document's SHA-256 fingerprint to stderr
        #[arg(long)]
        fingerprint: bool,
    },

    /// Evaluate and export a plan script without printing the document
    Check {
        /// Script file (reads stdin if not provided)
        file: Option<PathBuf>,
    },

    /// List every function with its signature
    Functions {
        /// Emit JSON instead of one line per function
        #[arg(long)]
        json: bool,
    },

    /// List the type ontology with each type's ancestors
    Types,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    logging::init(&config.logging);

    if let Err(e) = run(cli.command, &mut config) {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &mut Config) -> anyhow::Result<()> {
    match command {
        Commands::Export {
            file,
            pretty,
            fingerprint,
        } => {
            // flags only switch options on; config and env decide the rest
            config.output.pretty |= pretty;
            config.output.fingerprint |= fingerprint;

            let source = commands::read_source(file.as_deref())?;
            let output = commands::export(&source, &config.output)?;
            println!("{}", output.document);
            if let Some(fingerprint) = output.fingerprint {
                eprintln!("sha256:{}", fingerprint);
            }
        }
        Commands::Check { file } => {
            let source = commands::read_source(file.as_deref())?;
            let stages = commands::check(&source)?;
            println!("ok: {} stages", stages);
        }
        Commands::Functions { json } => println!("{}", commands::functions(json)?),
        Commands::Types => println!("{}", commands::types()),
    }
    Ok(())
}
